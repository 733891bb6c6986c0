use crate::engine::reconcile::{self, Applied};
use crate::models::{LiveEvent, Message, MessageId};

/// How a send response was folded into the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The pending entry now holds the authoritative record.
    Replaced,
    /// The authoritative record was already present; the pending entry was dropped.
    Collapsed,
    /// No pending entry with that id exists any more.
    Missing,
}

/// Ordered message list of one open conversation.
///
/// Oldest first. Authoritative ids are unique; pending entries only ever
/// enter through `push_optimistic` and leave through `resolve_pending` or
/// `remove_pending`.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    items: Vec<Message>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.items.iter().any(|m| &m.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|m| m.is_pending()).count()
    }

    pub fn has_pending_token(&self, token: &str) -> bool {
        self.items
            .iter()
            .any(|m| m.is_pending() && m.client_token.as_deref() == Some(token))
    }

    /// Older history goes above everything already shown.
    pub fn prepend_page(&mut self, page: Vec<Message>) -> usize {
        reconcile::merge_prepend(&mut self.items, page)
    }

    pub fn push_optimistic(&mut self, message: Message) {
        debug_assert!(message.is_pending());
        self.items.push(message);
    }

    /// Swaps the pending entry for the server's record, looked up by id
    /// rather than index since other writers may have shifted positions.
    pub fn resolve_pending(&mut self, pending_id: &MessageId, record: Message) -> Resolution {
        let Some(idx) = self.items.iter().position(|m| &m.id == pending_id) else {
            return Resolution::Missing;
        };

        if self.contains(&record.id) {
            self.items.remove(idx);
            Resolution::Collapsed
        } else {
            self.items[idx] = record;
            Resolution::Replaced
        }
    }

    pub fn remove_pending(&mut self, pending_id: &MessageId) -> bool {
        let before = self.items.len();
        self.items.retain(|m| &m.id != pending_id);
        self.items.len() != before
    }

    pub fn apply_remote(&mut self, event: LiveEvent<Message>) -> Applied {
        reconcile::apply(&mut self.items, event)
    }
}
