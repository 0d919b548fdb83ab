//! Data models for keepsake.
//!
//! Defines the three record kinds (backgrounds, messages, memories) as they
//! are returned to clients. Field names serialize in camelCase and ids as
//! `_id`, which is the shape existing clients of the service expect.

mod background;
mod memory;
mod message;

pub use background::*;
pub use memory::*;
pub use message::*;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Generate a new UUID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way it is stored: fixed-width RFC 3339, millisecond
/// precision, `Z` suffix. Fixed width keeps string order equal to time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Kind of record that owns a blob reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Background,
    Memory,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Memory => "memory",
        }
    }
}

/// One record-to-blob reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobReference {
    pub owner: OwnerKind,
    pub owner_id: String,
    pub blob: String,
}
