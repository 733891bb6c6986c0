//! Conversation sync engine.
//!
//! Three writers share one ordered message list: history pages
//! (`pagination`), optimistic sends (`send`) and the live feed (`live`).
//! `lifecycle` owns the list and a generation counter; every asynchronous
//! continuation captures the generation it started under and is dropped if
//! the conversation changed before it resolved.

pub mod badges;
pub mod lifecycle;
pub mod live;
pub mod message_list;
pub mod pagination;
pub mod read_state;
pub mod reconcile;
pub mod send;
pub mod session;
pub mod state;

pub use badges::NotificationBadges;
pub use lifecycle::ChatEngine;
pub use message_list::{MessageList, Resolution};
pub use pagination::PageCursor;
pub use reconcile::{Applied, Keyed};
pub use state::ChatSnapshot;
