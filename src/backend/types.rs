use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AttachmentRef, ConversationSession, LiveEvent, Message, Notification};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request was dropped before completing")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub has_more: bool,
}

/// Body of a send request. `client_token` is echoed back on the stored
/// record so the sender can correlate its own create events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
    pub client_token: String,
}

pub type MessageCallback = Arc<dyn Fn(LiveEvent<Message>) + Send + Sync>;
pub type SessionCallback = Arc<dyn Fn(ConversationSession) + Send + Sync>;
pub type NotificationCallback = Arc<dyn Fn(LiveEvent<Notification>) + Send + Sync>;
