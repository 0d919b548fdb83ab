//! Seen-by tracking for messages.

use tracing::debug;

use crate::db::{self, DbPool};
use crate::error::{Error, Result};
use crate::models::Message;

/// Records which viewers have seen a message.
#[derive(Clone)]
pub struct PresenceService {
    db: DbPool,
}

impl PresenceService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Mark `message_id` as seen by `viewer`.
    ///
    /// Idempotent: a viewer already in the set leaves the record untouched.
    /// Unknown messages are `NotFound` and nothing is written.
    pub async fn mark_seen(&self, message_id: &str, viewer: &str) -> Result<Message> {
        let viewer = viewer.trim();
        if viewer.is_empty() {
            return Err(Error::missing_field("username"));
        }

        let message = db::get_message(&self.db, message_id).await?;
        if message.has_seen(viewer) {
            return Ok(message);
        }

        if db::append_seen_by(&self.db, message_id, viewer).await? {
            debug!(message_id = %message_id, viewer = %viewer, "Marked message seen");
        }

        // Re-read so concurrent viewers appended meanwhile are included.
        db::get_message(&self.db, message_id).await
    }
}
