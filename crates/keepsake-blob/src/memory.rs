//! In-memory blob store.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::naming::{generate_blob_name, validate_name};
use crate::{BlobError, BlobInfo, BlobStore, Result};

/// Blob store holding everything in a process-local map.
///
/// Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, (BlobInfo, Bytes)>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, filename: &str, content_type: &str, data: Bytes) -> Result<BlobInfo> {
        let mut blobs = self.blobs.write().await;

        let mut name = generate_blob_name(filename);
        let mut attempts = 1;
        while blobs.contains_key(&name) {
            if attempts >= 5 {
                return Err(BlobError::Storage(format!(
                    "no free blob name for {}",
                    filename
                )));
            }
            name = generate_blob_name(filename);
            attempts += 1;
        }

        let info = BlobInfo {
            name: name.clone(),
            content_type: content_type.to_string(),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        };
        blobs.insert(name, (info.clone(), data));
        Ok(info)
    }

    async fn get(&self, name: &str) -> Result<Option<(BlobInfo, Bytes)>> {
        validate_name(name)?;
        Ok(self.blobs.read().await.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.blobs.write().await.remove(name).is_some())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.blobs.read().await.contains_key(name))
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        let mut infos: Vec<BlobInfo> = self
            .blobs
            .read()
            .await
            .values()
            .map(|(info, _)| info.clone())
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }
}
