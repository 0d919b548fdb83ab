use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    /// Store-assigned unique name. This is the reference records hold.
    pub name: String,
    /// MIME content type (e.g. `"image/jpeg"`).
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// When the blob was written.
    pub created_at: DateTime<Utc>,
}

/// Storage backend for uploaded blobs.
///
/// Each call is atomic on its own; there is no locking across calls.
/// Name uniqueness on [`put`](BlobStore::put) is the only guarantee
/// concurrent callers rely on.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend identifier (e.g. `"filesystem"`).
    fn backend(&self) -> &'static str;

    /// Persist `data` under a freshly generated name derived from `filename`.
    ///
    /// Never overwrites an existing blob.
    async fn put(&self, filename: &str, content_type: &str, data: Bytes) -> Result<BlobInfo>;

    /// Retrieve a blob. Returns `None` if it does not exist.
    async fn get(&self, name: &str) -> Result<Option<(BlobInfo, Bytes)>>;

    /// Delete a blob. Returns `true` if the blob existed.
    ///
    /// Deleting a missing blob is not an error.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Check whether a blob exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// List every blob in the store.
    async fn list(&self) -> Result<Vec<BlobInfo>>;
}
