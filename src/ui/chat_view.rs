use freight_chat::models::{Message, MessageKind};
use freight_chat::ChatSnapshot;

const SUBJECT_MAX: usize = 50;

/// Plain-text rendering of the last `tail` messages plus a status line.
pub fn render(snapshot: &ChatSnapshot, current_user: &str, tail: usize) -> String {
    let mut output = String::new();

    let subject = snapshot
        .session
        .as_ref()
        .map(|s| truncate_subject(&s.subject))
        .or_else(|| snapshot.conversation_id.clone())
        .unwrap_or_else(|| "No conversation".to_string());
    output.push_str(&format!("== {} ==\n", subject));

    if snapshot.has_more && !snapshot.loading {
        output.push_str("   (older messages: /more)\n");
    }

    let start = snapshot.messages.len().saturating_sub(tail);
    let mut last_date: Option<String> = None;
    for msg in &snapshot.messages[start..] {
        let date = msg.created_at.date_naive().to_string();
        if last_date.as_deref() != Some(&date) {
            output.push_str(&format!("-- {} --\n", msg.created_at.format("%B %e, %Y")));
            last_date = Some(date);
        }
        output.push_str(&format_message(msg, current_user));
        output.push('\n');
    }

    if let Some(status) = status_line(snapshot) {
        output.push_str(&status);
        output.push('\n');
    }
    output
}

fn format_message(msg: &Message, current_user: &str) -> String {
    let who = if msg.sender_id == current_user {
        "you"
    } else {
        msg.sender_id.as_str()
    };

    let mut body = msg.content.clone().unwrap_or_default();
    if msg.kind == MessageKind::File {
        let name = msg
            .attachment
            .as_ref()
            .map(|a| a.file_name.clone().unwrap_or_else(|| a.key.clone()))
            .unwrap_or_else(|| "attachment".to_string());
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(&format!("[file: {}]", name));
    }

    let mut line = format!("[{}] {}: {}", msg.created_at.format("%H:%M"), who, body);
    if msg.is_pending() {
        line.push_str(" (sending...)");
    } else if msg.sender_id == current_user && msg.read {
        line.push_str(" (read)");
    }
    line
}

fn status_line(snapshot: &ChatSnapshot) -> Option<String> {
    if let Some(error) = &snapshot.error {
        return Some(format!("!! {}", error));
    }
    if snapshot.loading {
        Some("   loading...".to_string())
    } else if snapshot.loading_more {
        Some("   loading older messages...".to_string())
    } else {
        None
    }
}

/// Truncate a conversation subject to a single short header line.
pub fn truncate_subject(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    if first_line.chars().count() > SUBJECT_MAX {
        let truncated: String = first_line.chars().take(SUBJECT_MAX - 3).collect();
        format!("{}...", truncated)
    } else {
        first_line.to_string()
    }
}
