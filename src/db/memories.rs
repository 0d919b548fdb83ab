//! Memory database queries.
//!
//! Memories carry an ordered list of blob names in the `images` column.
//! The blobs themselves are managed by the attachment service; these
//! queries only ever touch the record.

use crate::models::{format_timestamp, now, BlobReference, Memory, OwnerKind};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::{parse_string_list, parse_timestamp, DbPool};

// ============================================================================
// Types
// ============================================================================

impl<'r> FromRow<'r, SqliteRow> for Memory {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let date: String = row.try_get("date")?;
        let images: String = row.try_get("images")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            date: parse_timestamp("date", &date)?,
            sender: row.try_get("sender")?,
            images: parse_string_list("images", &images)?,
            created_at: parse_timestamp("created_at", &created_at)?,
        })
    }
}

/// Input for creating a memory.
#[derive(Debug, Clone)]
pub struct CreateMemory {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub sender: String,
    /// Blob names, already stored, in upload order.
    pub images: Vec<String>,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new memory.
pub async fn create_memory(pool: &DbPool, input: CreateMemory) -> Result<Memory> {
    let images = serde_json::to_string(&input.images)
        .map_err(|e| Error::Internal(format!("Failed to encode images: {}", e)))?;

    sqlx::query_as::<_, Memory>(
        r#"
        INSERT INTO memories (id, title, description, date, sender, images, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(format_timestamp(input.date))
    .bind(&input.sender)
    .bind(&images)
    .bind(format_timestamp(now()))
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List all memories, most recent `date` first.
pub async fn list_memories(pool: &DbPool) -> Result<Vec<Memory>> {
    sqlx::query_as::<_, Memory>(
        "SELECT * FROM memories ORDER BY date DESC, created_at DESC, rowid DESC",
    )
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Get a memory by ID.
pub async fn get_memory(pool: &DbPool, id: &str) -> Result<Memory> {
    sqlx::query_as::<_, Memory>("SELECT * FROM memories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Memory".into()))
}

/// Delete a memory by ID.
/// Note: This only deletes the database record, not the image blobs.
pub async fn delete_memory(pool: &DbPool, id: &str) -> Result<Memory> {
    sqlx::query_as::<_, Memory>("DELETE FROM memories WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Memory".into()))
}

/// Count memories.
pub async fn count_memories(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memories")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// List every image blob referenced by any memory (for reconciliation).
pub async fn list_memory_blob_refs(pool: &DbPool) -> Result<Vec<BlobReference>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT memories.id, image.value
        FROM memories, json_each(memories.images) AS image
        ORDER BY memories.id, image.key
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(owner_id, blob)| BlobReference {
            owner: OwnerKind::Memory,
            owner_id,
            blob,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};
    use crate::models::new_id;
    use chrono::TimeZone;

    async fn setup_test_db() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        pool
    }

    fn input(title: &str, date: DateTime<Utc>, images: &[&str]) -> CreateMemory {
        CreateMemory {
            id: new_id(),
            title: title.to_string(),
            description: String::new(),
            date,
            sender: "alice".to_string(),
            images: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_memory_keeps_image_order() {
        let pool = setup_test_db().await;
        let date = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

        let created = create_memory(&pool, input("Trip", date, &["b.jpg", "a.jpg", "c.jpg"]))
            .await
            .unwrap();
        assert_eq!(created.images, vec!["b.jpg", "a.jpg", "c.jpg"]);
        assert_eq!(created.date, date);

        let fetched = get_memory(&pool, &created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_memories_by_date_descending() {
        let pool = setup_test_db().await;
        let early = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        // Created in the opposite order of their dates.
        create_memory(&pool, input("Late", late, &[])).await.unwrap();
        create_memory(&pool, input("Early", early, &[])).await.unwrap();

        let titles: Vec<String> = list_memories(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Late", "Early"]);
    }

    #[tokio::test]
    async fn test_memory_blob_refs() {
        let pool = setup_test_db().await;
        let date = Utc::now();
        let with_images = create_memory(&pool, input("A", date, &["x.png", "y.png"]))
            .await
            .unwrap();
        create_memory(&pool, input("B", date, &[])).await.unwrap();

        let refs = list_memory_blob_refs(&pool).await.unwrap();
        let blobs: Vec<&str> = refs.iter().map(|r| r.blob.as_str()).collect();
        assert_eq!(blobs, vec!["x.png", "y.png"]);
        assert!(refs.iter().all(|r| r.owner_id == with_images.id));
        assert!(refs.iter().all(|r| r.owner == OwnerKind::Memory));
    }

    #[tokio::test]
    async fn test_delete_memory_returns_record() {
        let pool = setup_test_db().await;
        let created = create_memory(&pool, input("Gone", Utc::now(), &["z.png"]))
            .await
            .unwrap();

        let deleted = delete_memory(&pool, &created.id).await.unwrap();
        assert_eq!(deleted.images, vec!["z.png"]);
        assert_eq!(count_memories(&pool).await.unwrap(), 0);
        assert!(matches!(
            get_memory(&pool, &created.id).await,
            Err(Error::NotFound(_))
        ));
    }
}
