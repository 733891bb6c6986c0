pub mod backend;
pub mod config;
pub mod engine;
pub mod models;
pub mod settings;

pub use backend::{ChatBackend, HttpBackend, LiveFeed, Subscription};
pub use engine::{ChatEngine, ChatSnapshot, NotificationBadges};
pub use settings::EngineSettings;
