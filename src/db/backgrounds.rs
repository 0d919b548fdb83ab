//! Background database queries.
//!
//! Backgrounds are kept as a history; the newest row is the active one.

use crate::models::{format_timestamp, now, Background, BackgroundType, BlobReference, OwnerKind};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::{parse_timestamp, DbPool};

// ============================================================================
// Types
// ============================================================================

impl<'r> FromRow<'r, SqliteRow> for Background {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let background_type: String = row.try_get("background_type")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            background_type: BackgroundType::from_str(&background_type).ok_or_else(|| {
                sqlx::Error::ColumnDecode {
                    index: "background_type".into(),
                    source: format!("unknown background type: {}", background_type).into(),
                }
            })?,
            background_value: row.try_get("background_value")?,
            created_at: parse_timestamp("created_at", &created_at)?,
        })
    }
}

/// Input for creating a background.
#[derive(Debug, Clone)]
pub struct CreateBackground {
    pub id: String,
    pub background_type: BackgroundType,
    pub background_value: String,
}

/// Input for replacing a background's setting. `created_at` never changes.
#[derive(Debug, Clone)]
pub struct UpdateBackground {
    pub background_type: BackgroundType,
    pub background_value: String,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new background.
pub async fn create_background(pool: &DbPool, input: CreateBackground) -> Result<Background> {
    sqlx::query_as::<_, Background>(
        r#"
        INSERT INTO backgrounds (id, background_type, background_value, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(input.background_type.as_str())
    .bind(&input.background_value)
    .bind(format_timestamp(now()))
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List all backgrounds, newest first.
pub async fn list_backgrounds(pool: &DbPool) -> Result<Vec<Background>> {
    sqlx::query_as::<_, Background>(
        "SELECT * FROM backgrounds ORDER BY created_at DESC, rowid DESC",
    )
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Get the most recently created background, if any.
pub async fn get_latest_background(pool: &DbPool) -> Result<Option<Background>> {
    sqlx::query_as::<_, Background>(
        "SELECT * FROM backgrounds ORDER BY created_at DESC, rowid DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)
}

/// Get a background by ID.
pub async fn get_background(pool: &DbPool, id: &str) -> Result<Background> {
    sqlx::query_as::<_, Background>("SELECT * FROM backgrounds WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Background".into()))
}

/// Replace a background's type and value.
pub async fn update_background(
    pool: &DbPool,
    id: &str,
    input: UpdateBackground,
) -> Result<Background> {
    sqlx::query_as::<_, Background>(
        r#"
        UPDATE backgrounds
        SET background_type = ?, background_value = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(input.background_type.as_str())
    .bind(&input.background_value)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound("Background".into()))
}

/// Delete a background by ID.
/// Note: This only deletes the database record, not its blob.
pub async fn delete_background(pool: &DbPool, id: &str) -> Result<Background> {
    sqlx::query_as::<_, Background>("DELETE FROM backgrounds WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Background".into()))
}

/// Count backgrounds.
pub async fn count_backgrounds(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM backgrounds")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// List every blob referenced by a custom background (for reconciliation).
pub async fn list_background_blob_refs(pool: &DbPool) -> Result<Vec<BlobReference>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, background_value FROM backgrounds WHERE background_type = 'custom'",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(owner_id, blob)| BlobReference {
            owner: OwnerKind::Background,
            owner_id,
            blob,
        })
        .collect())
}
