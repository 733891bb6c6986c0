//! Keyed create/update/delete reconciliation shared by every live-updated list.

use std::collections::HashSet;

use crate::models::{LiveAction, LiveEvent, Message, Notification};

/// A record that may carry a server-assigned key. Records without one
/// (optimistic entries) are invisible to remote mutations.
pub trait Keyed {
    fn key(&self) -> Option<&str>;
}

impl Keyed for Message {
    fn key(&self) -> Option<&str> {
        self.authoritative_id()
    }
}

impl Keyed for Notification {
    fn key(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
    Removed,
    Ignored,
}

fn position<T: Keyed>(items: &[T], key: &str) -> Option<usize> {
    items.iter().position(|item| item.key() == Some(key))
}

/// Applies one remote event.
///
/// Creates append only when the key is absent, so redelivery is harmless.
/// Updates and deletes for keys not in view are dropped.
pub fn apply<T: Keyed>(items: &mut Vec<T>, event: LiveEvent<T>) -> Applied {
    let Some(key) = event.record.key().map(str::to_string) else {
        return Applied::Ignored;
    };

    match (event.action, position(items, &key)) {
        (LiveAction::Create, None) => {
            items.push(event.record);
            Applied::Inserted
        }
        (LiveAction::Update, Some(idx)) => {
            items[idx] = event.record;
            Applied::Replaced
        }
        (LiveAction::Delete, Some(idx)) => {
            items.remove(idx);
            Applied::Removed
        }
        _ => Applied::Ignored,
    }
}

/// Puts `incoming` in front of `items`, skipping keys already present
/// (in either list). Returns how many records were added.
pub fn merge_prepend<T: Keyed>(items: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let mut seen: HashSet<String> = items
        .iter()
        .filter_map(|item| item.key().map(str::to_string))
        .collect();

    let mut fresh: Vec<T> = incoming
        .into_iter()
        .filter(|item| match item.key() {
            Some(key) => seen.insert(key.to_string()),
            None => true,
        })
        .collect();

    let added = fresh.len();
    fresh.append(items);
    *items = fresh;
    added
}
