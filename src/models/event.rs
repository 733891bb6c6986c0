use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveAction {
    Create,
    Update,
    Delete,
}

impl LiveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveAction::Create => "create",
            LiveAction::Update => "update",
            LiveAction::Delete => "delete",
        }
    }
}

/// One change notification delivered by a live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent<T> {
    pub action: LiveAction,
    pub record: T,
}

impl<T> LiveEvent<T> {
    pub fn new(action: LiveAction, record: T) -> Self {
        Self { action, record }
    }
}
