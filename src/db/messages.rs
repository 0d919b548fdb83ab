//! Message database queries.

use crate::models::{format_timestamp, now, Message};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::{parse_string_list, parse_timestamp, DbPool};

impl<'r> FromRow<'r, SqliteRow> for Message {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let seen_by: String = row.try_get("seen_by")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            sender: row.try_get("sender")?,
            content: row.try_get("content")?,
            seen_by: parse_string_list("seen_by", &seen_by)?,
            created_at: parse_timestamp("created_at", &created_at)?,
        })
    }
}

/// Input for creating a message.
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub id: String,
    pub sender: String,
    pub content: String,
}

/// Create a new message with an empty `seen_by` set.
pub async fn create_message(pool: &DbPool, input: CreateMessage) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, sender, content, seen_by, created_at)
        VALUES (?, ?, ?, '[]', ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.sender)
    .bind(&input.content)
    .bind(format_timestamp(now()))
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List all messages, newest first.
pub async fn list_messages(pool: &DbPool) -> Result<Vec<Message>> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages ORDER BY created_at DESC, rowid DESC")
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Get a message by ID.
pub async fn get_message(pool: &DbPool, id: &str) -> Result<Message> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Message".into()))
}

/// Append a viewer to a message's `seen_by` set.
///
/// A single conditional statement: the viewer is appended only if not
/// already present, so concurrent appends for different viewers cannot
/// overwrite each other. Returns `true` if the row changed.
pub async fn append_seen_by(pool: &DbPool, id: &str, viewer: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET seen_by = json_insert(seen_by, '$[#]', ?)
        WHERE id = ?
          AND NOT EXISTS (
              SELECT 1 FROM json_each(messages.seen_by) WHERE json_each.value = ?
          )
        "#,
    )
    .bind(viewer)
    .bind(id)
    .bind(viewer)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a message by ID.
pub async fn delete_message(pool: &DbPool, id: &str) -> Result<Message> {
    sqlx::query_as::<_, Message>("DELETE FROM messages WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Message".into()))
}

/// Count messages.
pub async fn count_messages(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
