//! Filesystem blob store.
//!
//! Blobs are plain files in a single flat directory, which is also what the
//! `/uploads` route serves from. Writes land in a hidden temp file first and
//! are renamed into place, so a reader never sees a half-written blob.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::naming::{content_type_for, generate_blob_name, validate_name};
use crate::{BlobError, BlobInfo, BlobStore, Result};

/// Attempts at finding an unused name before giving up.
const MAX_NAME_ATTEMPTS: usize = 5;

/// Blob store backed by a local directory.
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a store rooted at `root`. The directory is created by [`init`](Self::init).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Validate that the directory can be written, read back, and deleted.
    ///
    /// Run at startup so permission problems surface before the first upload.
    pub async fn validate(&self) -> Result<()> {
        self.init().await?;

        let probe = self.root.join(".health-check.tmp");
        let data = b"keepsake-health-check";

        fs::write(&probe, data).await?;
        let read_back = fs::read(&probe).await?;
        let _ = fs::remove_file(&probe).await;

        if read_back != data {
            return Err(BlobError::Storage(format!(
                "read-back mismatch in {}",
                self.root.display()
            )));
        }
        Ok(())
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    async fn write_atomic(&self, path: &Path, temp_path: &Path, data: &[u8]) -> Result<()> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(temp_path, path).await?;
        Ok(())
    }
}

fn info_from_metadata(name: &str, metadata: &std::fs::Metadata) -> BlobInfo {
    let created_at = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    BlobInfo {
        name: name.to_string(),
        content_type: content_type_for(name),
        size_bytes: metadata.len(),
        created_at,
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    fn backend(&self) -> &'static str {
        "filesystem"
    }

    async fn put(&self, filename: &str, content_type: &str, data: Bytes) -> Result<BlobInfo> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = generate_blob_name(filename);
            let path = self.path_for(&name)?;

            if fs::try_exists(&path).await? {
                debug!(blob = %name, "blob name taken, regenerating");
                continue;
            }

            let temp_path = self.root.join(format!(".{}.tmp", name));
            if let Err(e) = self.write_atomic(&path, &temp_path, &data).await {
                warn!(blob = %name, error = %e, "blob write failed");
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }

            debug!(blob = %name, size = data.len(), "blob stored");
            return Ok(BlobInfo {
                name,
                content_type: content_type.to_string(),
                size_bytes: data.len() as u64,
                created_at: Utc::now(),
            });
        }

        Err(BlobError::Storage(format!(
            "no free blob name for {} after {} attempts",
            filename, MAX_NAME_ATTEMPTS
        )))
    }

    async fn get(&self, name: &str) -> Result<Option<(BlobInfo, Bytes)>> {
        let path = self.path_for(name)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let metadata = fs::metadata(&path).await?;

        Ok(Some((info_from_metadata(name, &metadata), Bytes::from(data))))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(blob = %name, "blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        let mut blobs = Vec::new();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(blobs),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            // Temp files and probes are hidden.
            if name.starts_with('.') {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            blobs.push(info_from_metadata(name, &metadata));
        }

        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }
}
