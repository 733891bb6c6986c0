use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::{ChatBackend, LiveFeed, NotificationCallback, Subscription};
use crate::engine::reconcile;
use crate::models::{LiveEvent, Notification};

#[derive(Default)]
struct BadgeState {
    generation: u64,
    user_id: Option<String>,
    items: Vec<Notification>,
    subscription: Option<Subscription>,
    last_error: Option<String>,
}

struct BadgeShared {
    state: Mutex<BadgeState>,
    revision: watch::Sender<u64>,
}

impl BadgeShared {
    fn lock(&self) -> MutexGuard<'_, BadgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_current(&self, generation: u64, f: impl FnOnce(&mut BadgeState)) {
        let applied = {
            let mut state = self.lock();
            if state.generation == generation && state.user_id.is_some() {
                f(&mut state);
                true
            } else {
                false
            }
        };
        if applied {
            self.revision.send_modify(|rev| *rev += 1);
        }
    }
}

/// Unread-notification cache behind the app's badge counters.
///
/// Same keyed reconciliation as the chat list, minus optimistic sends.
#[derive(Clone)]
pub struct NotificationBadges {
    backend: Arc<dyn ChatBackend>,
    feed: Arc<dyn LiveFeed>,
    shared: Arc<BadgeShared>,
}

impl NotificationBadges {
    pub fn new(backend: Arc<dyn ChatBackend>, feed: Arc<dyn LiveFeed>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            backend,
            feed,
            shared: Arc::new(BadgeShared {
                state: Mutex::new(BadgeState::default()),
                revision,
            }),
        }
    }

    /// Starts tracking `user_id`, replacing whoever was tracked before.
    pub fn open(&self, user_id: Option<&str>) -> Option<JoinHandle<()>> {
        let user_id = user_id.filter(|id| !id.is_empty()).map(str::to_string);
        let generation = self.reset(user_id.clone());
        let user_id = user_id?;

        let weak: Weak<BadgeShared> = Arc::downgrade(&self.shared);
        let on_event: NotificationCallback = Arc::new(move |event: LiveEvent<Notification>| {
            if let Some(shared) = weak.upgrade() {
                shared.with_current(generation, |state| {
                    reconcile::apply(&mut state.items, event);
                });
            }
        });
        let subscription = self.feed.subscribe_to_notifications(&user_id, on_event);
        self.shared.with_current(generation, |state| {
            state.subscription = Some(subscription);
        });

        let engine = self.clone();
        Some(tokio::spawn(async move {
            let result = engine.backend.fetch_notifications(&user_id).await;
            engine.shared.with_current(generation, |state| match result {
                Ok(items) => {
                    reconcile::merge_prepend(&mut state.items, items);
                    state.last_error = None;
                }
                Err(e) => {
                    tracing::error!(%user_id, "Failed to load notifications: {}", e);
                    state.last_error = Some(format!("Failed to load notifications: {}", e));
                }
            });
        }))
    }

    pub fn close(&self) {
        self.reset(None);
    }

    /// Bumps the generation and installs `user_id` under one lock.
    fn reset(&self, user_id: Option<String>) -> u64 {
        let (generation, released) = {
            let mut state = self.shared.lock();
            let generation = state.generation + 1;
            let released = state.subscription.take();
            *state = BadgeState {
                generation,
                user_id,
                ..BadgeState::default()
            };
            (generation, released)
        };
        if let Some(subscription) = released {
            subscription.unsubscribe();
        }
        self.shared.revision.send_modify(|rev| *rev += 1);
        generation
    }

    pub fn unread_count(&self) -> usize {
        self.shared.lock().items.iter().filter(|n| !n.read).count()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.shared.lock().items.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error.clone()
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }
}
