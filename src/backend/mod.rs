pub mod http;
#[cfg(test)]
pub mod mock;
pub mod subscription;
pub mod traits;
pub mod types;

pub use http::HttpBackend;
pub use subscription::Subscription;
pub use traits::{ChatBackend, LiveFeed};
pub use types::{
    BackendError, MessageCallback, MessagePage, NotificationCallback, OutgoingMessage,
    SessionCallback,
};
