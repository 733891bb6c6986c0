use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::{ChatBackend, LiveFeed, Subscription};
use crate::engine::state::{ChatSnapshot, OpenConversation, Shared};

/// Sync engine for the one conversation currently on screen.
///
/// Cloning is cheap and every clone drives the same state. Operations that
/// talk to the backend spawn onto the current Tokio runtime and must be
/// called from within one.
#[derive(Clone)]
pub struct ChatEngine {
    pub(crate) backend: Arc<dyn ChatBackend>,
    pub(crate) feed: Arc<dyn LiveFeed>,
    pub(crate) page_size: u32,
    pub(crate) shared: Arc<Shared>,
}

impl ChatEngine {
    pub fn new(backend: Arc<dyn ChatBackend>, feed: Arc<dyn LiveFeed>, page_size: u32) -> Self {
        Self {
            backend,
            feed,
            page_size: page_size.max(1),
            shared: Arc::new(Shared::new()),
        }
    }

    /// Switches to `conversation_id` as `current_user`.
    ///
    /// Always discards the previous conversation first. When either argument
    /// is missing or empty the engine stays idle with an empty list.
    /// Returns the task running the initial session and page loads.
    pub fn open(
        &self,
        conversation_id: Option<&str>,
        current_user: Option<&str>,
    ) -> Option<JoinHandle<()>> {
        let next = match (
            conversation_id.filter(|id| !id.is_empty()),
            current_user.filter(|user| !user.is_empty()),
        ) {
            (Some(conversation_id), Some(current_user)) => Some(OpenConversation::new(
                conversation_id.to_string(),
                current_user.to_string(),
                self.page_size,
            )),
            _ => None,
        };

        let Some(conversation_id) = next.as_ref().map(|conv| conv.conversation_id.clone()) else {
            let generation = self.replace_current(None);
            tracing::debug!(generation, "No conversation or user, engine idle");
            return None;
        };

        let generation = self.replace_current(next);
        tracing::debug!(%conversation_id, generation, "Opening conversation");

        let subscriptions = self.subscribe_live(generation, &conversation_id);
        let superseded = self
            .shared
            .with_current(generation, |conv| {
                conv.subscriptions = subscriptions;
            })
            .is_none();
        if superseded {
            // Another open won the race; the handles were dropped with the closure.
            return None;
        }

        let engine = self.clone();
        Some(tokio::spawn(async move {
            let messages = async {
                if engine.load_page(generation, &conversation_id, 1, false).await {
                    engine.mark_read(generation, &conversation_id).await;
                }
            };
            tokio::join!(engine.load_session(generation, &conversation_id), messages);
        }))
    }

    /// Discards the open conversation, if any.
    pub fn close(&self) {
        self.replace_current(None);
    }

    /// Advances the generation and swaps in `next` under one lock, so the
    /// installed conversation always belongs to the live generation. Feed
    /// handles of the previous conversation are released before this returns.
    fn replace_current(&self, next: Option<OpenConversation>) -> u64 {
        let (generation, released) = {
            let mut state = self.shared.lock();
            state.generation += 1;
            let released: Vec<Subscription> = std::mem::replace(&mut state.current, next)
                .map(|conv| {
                    tracing::debug!(conversation_id = %conv.conversation_id, "Closing conversation");
                    conv.subscriptions
                })
                .unwrap_or_default();
            (state.generation, released)
        };

        for subscription in released {
            subscription.unsubscribe();
        }
        self.shared.notify();
        generation
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot::of(self.shared.lock().current.as_ref())
    }

    /// Revision counter bumped on every state change.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.shared.subscribe()
    }

    pub fn clear_error(&self) {
        if self
            .shared
            .lock()
            .current
            .as_mut()
            .and_then(|conv| conv.last_error.take())
            .is_some()
        {
            self.shared.notify();
        }
    }
}
