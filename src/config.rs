pub const APP_DIR: &str = "freight-chat";

/// Prefix of client-generated ids for optimistic messages.
pub const PENDING_ID_PREFIX: &str = "pending-";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;

pub const ENV_BASE_URL: &str = "FREIGHT_CHAT_BASE_URL";
pub const ENV_TOKEN: &str = "FREIGHT_CHAT_TOKEN";
