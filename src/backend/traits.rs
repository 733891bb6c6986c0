use async_trait::async_trait;

use super::subscription::Subscription;
use super::types::{
    BackendError, MessageCallback, MessagePage, NotificationCallback, OutgoingMessage,
    SessionCallback,
};
use crate::models::{ConversationSession, Message, Notification};

/// Request/response calls against the remote data store.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn fetch_session(&self, conversation_id: &str)
        -> Result<ConversationSession, BackendError>;

    /// Page 1 holds the newest `page_size` messages, ascending within the page.
    async fn fetch_message_page(
        &self,
        conversation_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, BackendError>;

    async fn send_message(
        &self,
        conversation_id: &str,
        message: OutgoingMessage,
    ) -> Result<Message, BackendError>;

    async fn mark_all_unread_as_read(&self, conversation_id: &str) -> Result<(), BackendError>;

    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<Notification>, BackendError>;
}

/// Push delivery of change events, independent of the wire transport.
///
/// Implementations own reconnection; callbacks only ever see decoded events.
pub trait LiveFeed: Send + Sync {
    fn subscribe_to_messages(&self, conversation_id: &str, on_event: MessageCallback)
        -> Subscription;

    fn subscribe_to_session(&self, conversation_id: &str, on_change: SessionCallback)
        -> Subscription;

    fn subscribe_to_notifications(
        &self,
        user_id: &str,
        on_event: NotificationCallback,
    ) -> Subscription;
}
