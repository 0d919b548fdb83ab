use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dated memory with attached photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    /// When the remembered event happened (user supplied).
    pub date: DateTime<Utc>,
    pub sender: String,
    /// Blob names in upload order.
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}
