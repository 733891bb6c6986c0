use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::backend::Subscription;
use crate::engine::message_list::MessageList;
use crate::engine::pagination::PageCursor;
use crate::models::{ConversationSession, Message, MessageId};

/// Everything that exists only while one conversation is open.
#[derive(Debug)]
pub(crate) struct OpenConversation {
    pub conversation_id: String,
    pub current_user: String,
    pub session: Option<ConversationSession>,
    pub messages: MessageList,
    pub cursor: PageCursor,
    pub loading: bool,
    pub loading_more: bool,
    pub sends_in_flight: usize,
    pub last_error: Option<String>,
    pub subscriptions: Vec<Subscription>,
}

impl OpenConversation {
    pub fn new(conversation_id: String, current_user: String, page_size: u32) -> Self {
        Self {
            conversation_id,
            current_user,
            session: None,
            messages: MessageList::new(),
            cursor: PageCursor::new(page_size),
            loading: true,
            loading_more: false,
            sends_in_flight: 0,
            last_error: None,
            subscriptions: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ChatState {
    pub generation: u64,
    pub current: Option<OpenConversation>,
    next_pending: u64,
}

impl ChatState {
    pub fn allocate_pending_id(&mut self) -> MessageId {
        self.next_pending += 1;
        MessageId::Pending(self.next_pending)
    }
}

/// State plus change notification, shared by the engine handle, its
/// spawned continuations and (weakly) its live-feed callbacks.
pub(crate) struct Shared {
    state: Mutex<ChatState>,
    revision: watch::Sender<u64>,
}

impl Shared {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Mutex::new(ChatState::default()),
            revision,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        let state = self.lock();
        state.generation == generation && state.current.is_some()
    }

    /// Runs `f` against the open conversation only if `generation` is still
    /// the live one. Stale continuations get `None` and touch nothing.
    pub fn with_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut OpenConversation) -> R,
    ) -> Option<R> {
        let result = {
            let mut state = self.lock();
            if state.generation == generation {
                state.current.as_mut().map(f)
            } else {
                None
            }
        };

        match result {
            Some(_) => self.notify(),
            None => tracing::debug!(generation, "Discarding result for a closed conversation"),
        }
        result
    }
}

/// Read-only view handed to the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub conversation_id: Option<String>,
    pub session: Option<ConversationSession>,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub loading_more: bool,
    pub sending: bool,
    pub has_more: bool,
    pub error: Option<String>,
}

impl ChatSnapshot {
    pub(crate) fn of(conversation: Option<&OpenConversation>) -> Self {
        let Some(conv) = conversation else {
            return Self::default();
        };
        Self {
            conversation_id: Some(conv.conversation_id.clone()),
            session: conv.session.clone(),
            messages: conv.messages.as_slice().to_vec(),
            loading: conv.loading,
            loading_more: conv.loading_more,
            sending: conv.sends_in_flight > 0,
            has_more: conv.cursor.has_more(),
            error: conv.last_error.clone(),
        }
    }
}
