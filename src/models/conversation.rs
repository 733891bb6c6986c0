use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub subject: String,
    pub last_activity_at: DateTime<Utc>,
    #[serde(default)]
    pub participant_ids: Vec<String>,
}
