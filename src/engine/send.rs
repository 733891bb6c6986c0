use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::OutgoingMessage;
use crate::engine::lifecycle::ChatEngine;
use crate::engine::message_list::Resolution;
use crate::models::{AttachmentRef, Message, MessageId, MessageKind};

impl ChatEngine {
    /// Shows `content` immediately as a pending message, then sends it.
    ///
    /// On success the pending entry becomes the server's record; on failure
    /// it is removed and the error surfaced. Blank submissions without an
    /// attachment are ignored. Returns the task resolving the send.
    pub fn send_message(
        &self,
        content: &str,
        attachment: Option<AttachmentRef>,
    ) -> Option<JoinHandle<()>> {
        let content = (!content.trim().is_empty()).then(|| content.to_string());
        if content.is_none() && attachment.is_none() {
            return None;
        }

        let outgoing = OutgoingMessage {
            content: content.clone(),
            attachment: attachment.clone(),
            client_token: Uuid::new_v4().to_string(),
        };

        let (generation, conversation_id, pending_id) = {
            let mut state = self.shared.lock();
            if state.current.is_none() {
                return None;
            }
            let generation = state.generation;
            let pending_id = state.allocate_pending_id();
            let conv = state.current.as_mut()?;

            let now = Utc::now();
            let kind = if attachment.is_some() {
                MessageKind::File
            } else {
                MessageKind::Text
            };
            conv.messages.push_optimistic(Message {
                id: pending_id.clone(),
                conversation_id: conv.conversation_id.clone(),
                sender_id: conv.current_user.clone(),
                content,
                attachment,
                kind,
                read: false,
                client_token: Some(outgoing.client_token.clone()),
                created_at: now,
                updated_at: now,
            });
            conv.sends_in_flight += 1;
            (generation, conv.conversation_id.clone(), pending_id)
        };
        self.shared.notify();
        tracing::debug!(%conversation_id, %pending_id, "Queued optimistic message");

        let engine = self.clone();
        Some(tokio::spawn(async move {
            engine
                .resolve_send(generation, &conversation_id, pending_id, outgoing)
                .await;
        }))
    }

    async fn resolve_send(
        &self,
        generation: u64,
        conversation_id: &str,
        pending_id: MessageId,
        outgoing: OutgoingMessage,
    ) {
        let result = self.backend.send_message(conversation_id, outgoing).await;

        self.shared.with_current(generation, |conv| {
            conv.sends_in_flight = conv.sends_in_flight.saturating_sub(1);
            match result {
                Ok(record) => {
                    let id = record.id.to_string();
                    let resolution = conv.messages.resolve_pending(&pending_id, record);
                    if resolution == Resolution::Missing {
                        tracing::warn!(%pending_id, %id, "Sent message had no pending entry");
                    } else {
                        tracing::debug!(%pending_id, %id, ?resolution, "Message sent");
                    }
                    conv.last_error = None;
                }
                Err(e) => {
                    tracing::error!(conversation_id, %pending_id, "Failed to send message: {}", e);
                    conv.messages.remove_pending(&pending_id);
                    conv.last_error = Some(format!("Failed to send message: {}", e));
                }
            }
        });
    }
}
