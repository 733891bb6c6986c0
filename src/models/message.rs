use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::AttachmentRef;
use crate::config::PENDING_ID_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    File,
}

/// Identity of a message in the local list.
///
/// Server-assigned ids are `Authoritative`. Optimistic entries carry a
/// `Pending` counter until the send resolves; those render with the
/// `pending-` prefix and never leave the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageId {
    Authoritative(String),
    Pending(u64),
}

impl MessageId {
    pub fn is_pending(&self) -> bool {
        matches!(self, MessageId::Pending(_))
    }

    pub fn authoritative(&self) -> Option<&str> {
        match self {
            MessageId::Authoritative(id) => Some(id),
            MessageId::Pending(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Authoritative(id) => f.write_str(id),
            MessageId::Pending(n) => write!(f, "{}{}", PENDING_ID_PREFIX, n),
        }
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        match s
            .strip_prefix(PENDING_ID_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
        {
            Some(n) => MessageId::Pending(n),
            None => MessageId::Authoritative(s),
        }
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        MessageId::from(s.to_string())
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachment: Option<AttachmentRef>,
    pub kind: MessageKind,
    #[serde(default)]
    pub read: bool,
    /// Idempotency token of the send that produced this record, when the
    /// server echoes it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        self.id.is_pending()
    }

    pub fn authoritative_id(&self) -> Option<&str> {
        self.id.authoritative()
    }
}
