//! Database layer for keepsake.
//!
//! Provides SQLite connection pooling and query modules for the three
//! record kinds. Each query touches a single row, so SQLite's statement
//! atomicity is the only consistency guarantee relied on here.

mod backgrounds;
mod memories;
mod messages;
mod pool;

pub use backgrounds::*;
pub use memories::*;
pub use messages::*;
pub use pool::*;

use crate::Result;
use chrono::{DateTime, Utc};
use tracing::info;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Initialize the database connection pool.
///
/// Creates parent directories if needed and configures SQLite with
/// settings suited to concurrent access.
pub async fn init_pool(path: &str) -> Result<DbPool> {
    // In-memory databases are per-connection, so they get a single one.
    let config = if path == ":memory:" {
        PoolConfig::test()
    } else {
        PoolConfig::default()
    };

    let pool = create_pool_with_config(path, config).await?;

    info!("Database pool initialized: {}", path);

    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies the complete schema from schema.sql. Uses IF NOT EXISTS
/// clauses so it's safe to run multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    let schema = include_str!("../../schema.sql");

    info!("Initializing database schema");

    for statement in schema_statements(schema) {
        sqlx::query(&statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully");

    Ok(())
}

/// Split a schema script into statements.
///
/// `--` comments are removed before splitting on `;`, so a semicolon inside
/// a comment never ends a statement. The schema holds no string literals
/// containing `--`.
fn schema_statements(script: &str) -> Vec<String> {
    let without_comments: String = script
        .lines()
        .map(|line| match line.find("--") {
            Some(start) => &line[..start],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a stored timestamp column.
fn parse_timestamp(column: &str, value: &str) -> std::result::Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

/// Parse a JSON string-array column.
fn parse_string_list(column: &str, value: &str) -> std::result::Result<Vec<String>, sqlx::Error> {
    serde_json::from_str(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
