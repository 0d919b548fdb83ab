use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub sender: String,
    pub content: String,
    /// Viewers who have seen the message, in first-seen order, no duplicates.
    pub seen_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn has_seen(&self, viewer: &str) -> bool {
        self.seen_by.iter().any(|v| v == viewer)
    }
}
