//! Scripted collaborators for tests.
//!
//! Every backend call is handed to the test as a request value carrying a
//! reply channel, so the test decides when and in which order calls resolve.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::subscription::Subscription;
use super::traits::{ChatBackend, LiveFeed};
use super::types::{
    BackendError, MessageCallback, MessagePage, NotificationCallback, OutgoingMessage,
    SessionCallback,
};
use crate::models::{ConversationSession, LiveEvent, Message, Notification};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Reply<T> {
    tx: oneshot::Sender<Result<T, BackendError>>,
}

impl<T> Reply<T> {
    pub fn ok(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    pub fn err(self, error: BackendError) {
        let _ = self.tx.send(Err(error));
    }
}

pub struct SessionRequest {
    pub conversation_id: String,
    pub reply: Reply<ConversationSession>,
}

pub struct PageRequest {
    pub conversation_id: String,
    pub page: u32,
    pub page_size: u32,
    pub reply: Reply<MessagePage>,
}

pub struct SendRequest {
    pub conversation_id: String,
    pub message: OutgoingMessage,
    pub reply: Reply<Message>,
}

pub struct MarkReadRequest {
    pub conversation_id: String,
    pub reply: Reply<()>,
}

pub struct NotificationsRequest {
    pub user_id: String,
    pub reply: Reply<Vec<Notification>>,
}

pub struct MockBackend {
    sessions: mpsc::UnboundedSender<SessionRequest>,
    pages: mpsc::UnboundedSender<PageRequest>,
    sends: mpsc::UnboundedSender<SendRequest>,
    mark_reads: mpsc::UnboundedSender<MarkReadRequest>,
    notifications: mpsc::UnboundedSender<NotificationsRequest>,
}

/// Test-side ends of the `MockBackend` channels.
pub struct MockServer {
    sessions: mpsc::UnboundedReceiver<SessionRequest>,
    pages: mpsc::UnboundedReceiver<PageRequest>,
    sends: mpsc::UnboundedReceiver<SendRequest>,
    mark_reads: mpsc::UnboundedReceiver<MarkReadRequest>,
    notifications: mpsc::UnboundedReceiver<NotificationsRequest>,
}

pub fn mock_backend() -> (Arc<MockBackend>, MockServer) {
    let (sessions_tx, sessions) = mpsc::unbounded_channel();
    let (pages_tx, pages) = mpsc::unbounded_channel();
    let (sends_tx, sends) = mpsc::unbounded_channel();
    let (mark_reads_tx, mark_reads) = mpsc::unbounded_channel();
    let (notifications_tx, notifications) = mpsc::unbounded_channel();

    let backend = MockBackend {
        sessions: sessions_tx,
        pages: pages_tx,
        sends: sends_tx,
        mark_reads: mark_reads_tx,
        notifications: notifications_tx,
    };
    let server = MockServer {
        sessions,
        pages,
        sends,
        mark_reads,
        notifications,
    };
    (Arc::new(backend), server)
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>, what: &str) -> T {
    tokio::time::timeout(REQUEST_TIMEOUT, rx.recv())
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {} request", what))
        .unwrap_or_else(|| panic!("backend dropped while waiting for {} request", what))
}

impl MockServer {
    pub async fn next_session(&mut self) -> SessionRequest {
        next(&mut self.sessions, "session").await
    }

    pub async fn next_page(&mut self) -> PageRequest {
        next(&mut self.pages, "page").await
    }

    pub async fn next_send(&mut self) -> SendRequest {
        next(&mut self.sends, "send").await
    }

    pub async fn next_mark_read(&mut self) -> MarkReadRequest {
        next(&mut self.mark_reads, "mark-read").await
    }

    pub async fn next_notifications(&mut self) -> NotificationsRequest {
        next(&mut self.notifications, "notifications").await
    }

    pub fn try_next_page(&mut self) -> Option<PageRequest> {
        self.pages.try_recv().ok()
    }

    pub fn try_next_send(&mut self) -> Option<SendRequest> {
        self.sends.try_recv().ok()
    }

    pub fn try_next_mark_read(&mut self) -> Option<MarkReadRequest> {
        self.mark_reads.try_recv().ok()
    }
}

async fn call<R, T>(
    tx: &mpsc::UnboundedSender<R>,
    build: impl FnOnce(Reply<T>) -> R,
) -> Result<T, BackendError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(build(Reply { tx: reply_tx }))
        .map_err(|_| BackendError::Closed)?;
    reply_rx.await.map_err(|_| BackendError::Closed)?
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn fetch_session(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSession, BackendError> {
        call(&self.sessions, |reply| SessionRequest {
            conversation_id: conversation_id.to_string(),
            reply,
        })
        .await
    }

    async fn fetch_message_page(
        &self,
        conversation_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, BackendError> {
        call(&self.pages, |reply| PageRequest {
            conversation_id: conversation_id.to_string(),
            page,
            page_size,
            reply,
        })
        .await
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        message: OutgoingMessage,
    ) -> Result<Message, BackendError> {
        call(&self.sends, |reply| SendRequest {
            conversation_id: conversation_id.to_string(),
            message,
            reply,
        })
        .await
    }

    async fn mark_all_unread_as_read(&self, conversation_id: &str) -> Result<(), BackendError> {
        call(&self.mark_reads, |reply| MarkReadRequest {
            conversation_id: conversation_id.to_string(),
            reply,
        })
        .await
    }

    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<Notification>, BackendError> {
        call(&self.notifications, |reply| NotificationsRequest {
            user_id: user_id.to_string(),
            reply,
        })
        .await
    }
}

#[derive(Default)]
struct FeedRegistry {
    next_id: u64,
    messages: Vec<(u64, String, MessageCallback)>,
    sessions: Vec<(u64, String, SessionCallback)>,
    notifications: Vec<(u64, String, NotificationCallback)>,
}

/// In-process live feed; tests push events with the `emit_*` methods.
#[derive(Clone, Default)]
pub struct MockFeed {
    registry: Arc<Mutex<FeedRegistry>>,
}

impl MockFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, FeedRegistry> {
        self.registry.lock().unwrap()
    }

    fn release_handle(&self, id: u64) -> Subscription {
        let registry = self.registry.clone();
        Subscription::new(move || {
            let mut registry = registry.lock().unwrap();
            registry.messages.retain(|(sub_id, _, _)| *sub_id != id);
            registry.sessions.retain(|(sub_id, _, _)| *sub_id != id);
            registry.notifications.retain(|(sub_id, _, _)| *sub_id != id);
        })
    }

    fn allocate_id(&self) -> u64 {
        let mut registry = self.registry();
        registry.next_id += 1;
        registry.next_id
    }

    // Callbacks are cloned out before invocation so they may re-enter the feed.
    pub fn emit_message(&self, conversation_id: &str, event: LiveEvent<Message>) {
        let callbacks: Vec<MessageCallback> = self
            .registry()
            .messages
            .iter()
            .filter(|(_, key, _)| key == conversation_id)
            .map(|(_, _, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb(event.clone());
        }
    }

    pub fn emit_session(&self, session: ConversationSession) {
        let callbacks: Vec<SessionCallback> = self
            .registry()
            .sessions
            .iter()
            .filter(|(_, key, _)| *key == session.id)
            .map(|(_, _, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb(session.clone());
        }
    }

    pub fn emit_notification(&self, user_id: &str, event: LiveEvent<Notification>) {
        let callbacks: Vec<NotificationCallback> = self
            .registry()
            .notifications
            .iter()
            .filter(|(_, key, _)| key == user_id)
            .map(|(_, _, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb(event.clone());
        }
    }

    pub fn message_subscribers(&self, conversation_id: &str) -> usize {
        self.registry()
            .messages
            .iter()
            .filter(|(_, key, _)| key == conversation_id)
            .count()
    }

    pub fn session_subscribers(&self, conversation_id: &str) -> usize {
        self.registry()
            .sessions
            .iter()
            .filter(|(_, key, _)| key == conversation_id)
            .count()
    }

    pub fn total_subscribers(&self) -> usize {
        let registry = self.registry();
        registry.messages.len() + registry.sessions.len() + registry.notifications.len()
    }
}

impl LiveFeed for MockFeed {
    fn subscribe_to_messages(
        &self,
        conversation_id: &str,
        on_event: MessageCallback,
    ) -> Subscription {
        let id = self.allocate_id();
        self.registry()
            .messages
            .push((id, conversation_id.to_string(), on_event));
        self.release_handle(id)
    }

    fn subscribe_to_session(
        &self,
        conversation_id: &str,
        on_change: SessionCallback,
    ) -> Subscription {
        let id = self.allocate_id();
        self.registry()
            .sessions
            .push((id, conversation_id.to_string(), on_change));
        self.release_handle(id)
    }

    fn subscribe_to_notifications(
        &self,
        user_id: &str,
        on_event: NotificationCallback,
    ) -> Subscription {
        let id = self.allocate_id();
        self.registry()
            .notifications
            .push((id, user_id.to_string(), on_event));
        self.release_handle(id)
    }
}

/// Lets spawned engine tasks run until they block on the next request.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
