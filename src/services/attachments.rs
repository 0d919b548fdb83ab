//! Attachment coordinator.
//!
//! Every operation that touches both the blob store and the record store
//! goes through here. There is no transaction spanning the two, so the
//! steps run in a fixed order:
//!
//! - creates put every blob first and insert the record last
//! - deletes remove every blob first and delete the record last
//! - replaces put the new blob, update the record, then drop the old blob
//!
//! The worst outcome of a partial failure is an orphaned blob, which the
//! reconciliation sweep can find. A record is never written pointing at a
//! blob that was not stored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use keepsake_blob::{BlobInfo, BlobStore};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::UploadLimits;
use crate::db::{self, CreateBackground, CreateMemory, DbPool, UpdateBackground};
use crate::error::{Error, Result};
use crate::models::{new_id, Background, BackgroundType, Memory};

// ============================================================================
// Inputs
// ============================================================================

/// One uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Upload {
    /// Build an upload, guessing the content type from the filename when the
    /// client sent none (or only the generic octet-stream type).
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, data: Bytes) -> Self {
        let filename = filename.into();
        let content_type = match content_type {
            Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_string(),
            _ => mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };

        Self {
            filename,
            content_type,
            data,
        }
    }
}

/// Fields for creating or replacing a background, as received.
#[derive(Debug, Clone, Default)]
pub struct BackgroundInput {
    pub background_type: Option<String>,
    pub background_value: Option<String>,
    pub image: Option<Upload>,
}

/// Fields for creating a memory, as received.
#[derive(Debug, Clone, Default)]
pub struct MemoryInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub sender: Option<String>,
    pub images: Vec<Upload>,
}

/// A validated background setting.
enum BackgroundSource {
    Preset(String),
    Custom(Upload),
}

// ============================================================================
// Service
// ============================================================================

/// Coordinates record writes with the blobs they reference.
#[derive(Clone)]
pub struct AttachmentService {
    db: DbPool,
    blobs: Arc<dyn BlobStore>,
    timeout: Duration,
    limits: UploadLimits,
}

impl AttachmentService {
    pub fn new(
        db: DbPool,
        blobs: Arc<dyn BlobStore>,
        timeout: Duration,
        limits: UploadLimits,
    ) -> Self {
        Self {
            db,
            blobs,
            timeout,
            limits,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Create a background, storing its image first when it is a custom one.
    pub async fn create_background(&self, input: BackgroundInput) -> Result<Background> {
        let deadline = self.deadline();
        let source = self.validate_background(input)?;

        let (background_type, background_value) = self.store_source(source, deadline).await?;
        let id = new_id();

        let created = within(
            deadline,
            "create background",
            db::create_background(
                &self.db,
                CreateBackground {
                    id: id.clone(),
                    background_type,
                    background_value: background_value.clone(),
                },
            ),
        )
        .await;

        match created {
            Ok(background) => {
                info!(background_id = %background.id, kind = background_type.as_str(), "Created background");
                Ok(background)
            }
            Err(e) => {
                if background_type == BackgroundType::Custom {
                    warn!(
                        background_id = %id,
                        blob = %background_value,
                        error = %e,
                        "Background insert failed, blob left for reconciliation"
                    );
                }
                Err(e)
            }
        }
    }

    /// Replace a background's setting.
    ///
    /// The new blob is stored and the record updated before the previous
    /// blob is released, so there is never a moment without a valid image.
    pub async fn replace_background(&self, id: &str, input: BackgroundInput) -> Result<Background> {
        let deadline = self.deadline();
        let source = self.validate_background(input)?;

        let previous = within(deadline, "load background", db::get_background(&self.db, id)).await?;

        let (background_type, background_value) = self.store_source(source, deadline).await?;

        let updated = within(
            deadline,
            "update background",
            db::update_background(
                &self.db,
                id,
                UpdateBackground {
                    background_type,
                    background_value: background_value.clone(),
                },
            ),
        )
        .await;

        let updated = match updated {
            Ok(background) => background,
            Err(e) => {
                if background_type == BackgroundType::Custom {
                    warn!(
                        background_id = %id,
                        blob = %background_value,
                        error = %e,
                        "Background update failed, blob left for reconciliation"
                    );
                }
                return Err(e);
            }
        };

        if let Some(old) = previous.blob_ref() {
            if updated.blob_ref() != Some(old) {
                self.release(&[old.to_string()], deadline).await;
            }
        }

        info!(background_id = %id, kind = background_type.as_str(), "Replaced background");
        Ok(updated)
    }

    /// Delete a background and, for a custom one, its blob.
    pub async fn delete_background(&self, id: &str) -> Result<()> {
        let deadline = self.deadline();

        let background =
            within(deadline, "load background", db::get_background(&self.db, id)).await?;

        if let Some(blob) = background.blob_ref() {
            self.release(&[blob.to_string()], deadline).await;
        }

        // A stalled blob delete may have spent the whole budget.
        within(self.deadline(), "delete background", db::delete_background(&self.db, id)).await?;

        info!(background_id = %id, "Deleted background");
        Ok(())
    }

    /// Create a memory, storing every image before the record.
    pub async fn create_memory(&self, input: MemoryInput) -> Result<Memory> {
        let deadline = self.deadline();

        let title = required("title", input.title)?;
        let sender = required("sender", input.sender)?;
        let date = input
            .date
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| Error::missing_field("date"))?;
        let date = parse_memory_date(&date)
            .ok_or_else(|| Error::Validation(format!("date is not a valid date: {}", date)))?;

        if input.images.len() > self.limits.max_files_per_memory {
            return Err(Error::Validation(format!(
                "too many images: {} (max {})",
                input.images.len(),
                self.limits.max_files_per_memory
            )));
        }
        for upload in &input.images {
            self.validate_upload(upload)?;
        }

        let stored = self.put_all(input.images, deadline).await?;
        let images: Vec<String> = stored.into_iter().map(|info| info.name).collect();
        let id = new_id();

        let created = within(
            deadline,
            "create memory",
            db::create_memory(
                &self.db,
                CreateMemory {
                    id: id.clone(),
                    title,
                    description: input.description.unwrap_or_default(),
                    date,
                    sender,
                    images: images.clone(),
                },
            ),
        )
        .await;

        match created {
            Ok(memory) => {
                info!(memory_id = %memory.id, images = memory.images.len(), "Created memory");
                Ok(memory)
            }
            Err(e) => {
                if !images.is_empty() {
                    warn!(
                        memory_id = %id,
                        blobs = ?images,
                        error = %e,
                        "Memory insert failed, blobs left for reconciliation"
                    );
                }
                Err(e)
            }
        }
    }

    /// Delete a memory and every image it references.
    pub async fn delete_memory(&self, id: &str) -> Result<()> {
        let deadline = self.deadline();

        let memory = within(deadline, "load memory", db::get_memory(&self.db, id)).await?;

        let released = self.release(&memory.images, deadline).await;

        within(self.deadline(), "delete memory", db::delete_memory(&self.db, id)).await?;

        info!(
            memory_id = %id,
            images = memory.images.len(),
            released,
            "Deleted memory"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------------

    fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    fn validate_background(&self, input: BackgroundInput) -> Result<BackgroundSource> {
        let raw_type = required("backgroundType", input.background_type)?;
        let background_type = BackgroundType::from_str(raw_type.trim()).ok_or_else(|| {
            Error::Validation(format!(
                "backgroundType must be 'preset' or 'custom', got '{}'",
                raw_type
            ))
        })?;

        match background_type {
            BackgroundType::Custom => {
                let upload = input
                    .image
                    .ok_or_else(|| Error::missing_field("backgroundImage"))?;
                self.validate_upload(&upload)?;
                Ok(BackgroundSource::Custom(upload))
            }
            BackgroundType::Preset => {
                if input.image.is_some() {
                    return Err(Error::Validation(
                        "a preset background does not take an image".into(),
                    ));
                }
                let value = required("backgroundValue", input.background_value)?;
                Ok(BackgroundSource::Preset(value))
            }
        }
    }

    fn validate_upload(&self, upload: &Upload) -> Result<()> {
        if upload.data.len() > self.limits.max_file_size {
            return Err(Error::FileTooLarge {
                max_size: self.limits.max_file_size,
            });
        }
        if !upload.content_type.starts_with("image/") {
            return Err(Error::InvalidFileType(format!(
                "{} is {}, expected an image",
                upload.filename, upload.content_type
            )));
        }
        Ok(())
    }

    /// Turn a validated background source into the stored type and value.
    async fn store_source(
        &self,
        source: BackgroundSource,
        deadline: Instant,
    ) -> Result<(BackgroundType, String)> {
        match source {
            BackgroundSource::Preset(value) => Ok((BackgroundType::Preset, value)),
            BackgroundSource::Custom(upload) => {
                let mut stored = self.put_all(vec![upload], deadline).await?;
                let info = stored
                    .pop()
                    .ok_or_else(|| Error::Internal("background image was not stored".into()))?;
                Ok((BackgroundType::Custom, info.name))
            }
        }
    }

    /// Store uploads in order. On the first failure every blob already
    /// stored by this call is deleted again and the failure is returned.
    async fn put_all(&self, uploads: Vec<Upload>, deadline: Instant) -> Result<Vec<BlobInfo>> {
        let mut stored: Vec<BlobInfo> = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let filename = upload.filename.clone();
            let result = within(
                deadline,
                "store image",
                self.blobs
                    .put(&upload.filename, &upload.content_type, upload.data),
            )
            .await;

            match result {
                Ok(info) => {
                    debug!(blob = %info.name, size = info.size_bytes, "Stored blob");
                    stored.push(info);
                }
                Err(e) => {
                    warn!(
                        filename = %filename,
                        stored = stored.len(),
                        error = %e,
                        "Blob put failed, rolling back batch"
                    );
                    self.rollback(stored).await;
                    return Err(e);
                }
            }
        }

        Ok(stored)
    }

    /// Delete blobs of a failed batch, newest first.
    ///
    /// The operation deadline has usually passed by now, so each delete gets
    /// its own bound instead.
    async fn rollback(&self, stored: Vec<BlobInfo>) {
        for info in stored.into_iter().rev() {
            match timeout(self.timeout, self.blobs.delete(&info.name)).await {
                Ok(Ok(_)) => debug!(blob = %info.name, "Rolled back blob"),
                Ok(Err(e)) => {
                    warn!(blob = %info.name, error = %e, "Rollback delete failed")
                }
                Err(_) => warn!(blob = %info.name, "Rollback delete timed out"),
            }
        }
    }

    /// Best-effort delete of blobs whose record is going away.
    ///
    /// Failures and timeouts are logged one by one and never stop the loop.
    /// Callers run the record step after this under a fresh deadline.
    async fn release(&self, names: &[String], deadline: Instant) -> usize {
        let mut removed = 0;

        for name in names {
            match timeout_at(deadline, self.blobs.delete(name)).await {
                Ok(Ok(true)) => {
                    debug!(blob = %name, "Deleted blob");
                    removed += 1;
                }
                Ok(Ok(false)) => debug!(blob = %name, "Blob already absent"),
                Ok(Err(e)) => warn!(blob = %name, error = %e, "Blob delete failed, continuing"),
                Err(_) => warn!(blob = %name, "Blob delete timed out, continuing"),
            }
        }

        removed
    }
}

/// Run `fut` under the operation deadline.
async fn within<T, E, F>(deadline: Instant, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<Error>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(Error::Timeout(what.to_string())),
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::missing_field(field))
}

/// Parse a memory date: RFC 3339, a local-less `YYYY-MM-DDTHH:MM[:SS]`
/// (taken as UTC), or a bare `YYYY-MM-DD` (midnight UTC).
///
/// Years must fit in four digits; dates are stored as fixed-width text and
/// sorted lexically.
pub fn parse_memory_date(value: &str) -> Option<DateTime<Utc>> {
    parse_any_date(value.trim()).filter(|date| (0..=9999).contains(&date.year()))
}

fn parse_any_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};
    use async_trait::async_trait;
    use keepsake_blob::InMemoryBlobStore;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory store and fails every put after the first `ok_puts`.
    struct FailAfter {
        inner: InMemoryBlobStore,
        ok_puts: usize,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for FailAfter {
        fn backend(&self) -> &'static str {
            "fail-after"
        }

        async fn put(
            &self,
            filename: &str,
            content_type: &str,
            data: Bytes,
        ) -> keepsake_blob::Result<BlobInfo> {
            if self.puts.fetch_add(1, Ordering::SeqCst) >= self.ok_puts {
                return Err(keepsake_blob::BlobError::Storage("disk full".into()));
            }
            self.inner.put(filename, content_type, data).await
        }

        async fn get(&self, name: &str) -> keepsake_blob::Result<Option<(BlobInfo, Bytes)>> {
            self.inner.get(name).await
        }

        async fn delete(&self, name: &str) -> keepsake_blob::Result<bool> {
            self.inner.delete(name).await
        }

        async fn exists(&self, name: &str) -> keepsake_blob::Result<bool> {
            self.inner.exists(name).await
        }

        async fn list(&self) -> keepsake_blob::Result<Vec<BlobInfo>> {
            self.inner.list().await
        }
    }

    async fn service_with(blobs: Arc<dyn BlobStore>) -> AttachmentService {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        AttachmentService::new(pool, blobs, Duration::from_secs(5), UploadLimits::default())
    }

    fn png(name: &str) -> Upload {
        Upload::new(name, Some("image/png"), Bytes::from_static(b"\x89PNG fake"))
    }

    fn memory_input(images: Vec<Upload>) -> MemoryInput {
        MemoryInput {
            title: Some("Trip".into()),
            description: None,
            date: Some("2024-07-01".into()),
            sender: Some("alice".into()),
            images,
        }
    }

    #[tokio::test]
    async fn test_create_memory_stores_images_in_order() {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let service = service_with(blobs.clone()).await;

        let memory = service
            .create_memory(memory_input(vec![png("a.png"), png("b.png")]))
            .await
            .unwrap();

        assert_eq!(memory.images.len(), 2);
        assert!(memory.images[0].ends_with("-a.png"));
        assert!(memory.images[1].ends_with("-b.png"));
        assert_eq!(memory.description, "");
        for name in &memory.images {
            assert!(blobs.exists(name).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_failed_put_rolls_back_batch() {
        let store = Arc::new(FailAfter {
            inner: InMemoryBlobStore::new(),
            ok_puts: 2,
            puts: AtomicUsize::new(0),
        });
        let service = service_with(store.clone()).await;

        let result = service
            .create_memory(memory_input(vec![png("a.png"), png("b.png"), png("c.png")]))
            .await;

        assert!(matches!(result, Err(Error::Blob(_))));
        assert!(store.inner.is_empty().await);
        assert_eq!(db::count_memories(&service.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_memory_releases_images() {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let service = service_with(blobs.clone()).await;

        let memory = service
            .create_memory(memory_input(vec![png("a.png"), png("b.png")]))
            .await
            .unwrap();
        // One image vanishing out-of-band must not block the delete.
        blobs.delete(&memory.images[0]).await.unwrap();

        service.delete_memory(&memory.id).await.unwrap();

        assert!(blobs.is_empty().await);
        assert!(matches!(
            db::get_memory(&service.db, &memory.id).await,
            Err(Error::NotFound(_))
        ));
    }

    /// Deletes never resolve; everything else goes to the in-memory store.
    struct StalledDeletes {
        inner: InMemoryBlobStore,
    }

    #[async_trait]
    impl BlobStore for StalledDeletes {
        fn backend(&self) -> &'static str {
            "stalled-deletes"
        }

        async fn put(
            &self,
            filename: &str,
            content_type: &str,
            data: Bytes,
        ) -> keepsake_blob::Result<BlobInfo> {
            self.inner.put(filename, content_type, data).await
        }

        async fn get(&self, name: &str) -> keepsake_blob::Result<Option<(BlobInfo, Bytes)>> {
            self.inner.get(name).await
        }

        async fn delete(&self, _name: &str) -> keepsake_blob::Result<bool> {
            std::future::pending().await
        }

        async fn exists(&self, name: &str) -> keepsake_blob::Result<bool> {
            self.inner.exists(name).await
        }

        async fn list(&self) -> keepsake_blob::Result<Vec<BlobInfo>> {
            self.inner.list().await
        }
    }

    async fn stalled_delete_service() -> (AttachmentService, Arc<StalledDeletes>) {
        let blobs = Arc::new(StalledDeletes {
            inner: InMemoryBlobStore::new(),
        });
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        let service = AttachmentService::new(
            pool,
            blobs.clone(),
            Duration::from_millis(200),
            UploadLimits::default(),
        );
        (service, blobs)
    }

    #[tokio::test]
    async fn test_stalled_blob_delete_still_deletes_memory() {
        let (service, blobs) = stalled_delete_service().await;

        let memory = service
            .create_memory(memory_input(vec![png("a.png"), png("b.png")]))
            .await
            .unwrap();

        service.delete_memory(&memory.id).await.unwrap();

        assert!(matches!(
            db::get_memory(&service.db, &memory.id).await,
            Err(Error::NotFound(_))
        ));
        // The stuck blobs are left for the sweep.
        assert_eq!(blobs.inner.len().await, 2);
    }

    #[tokio::test]
    async fn test_stalled_blob_delete_still_deletes_background() {
        let (service, _blobs) = stalled_delete_service().await;

        let background = service
            .create_background(BackgroundInput {
                background_type: Some("custom".into()),
                background_value: None,
                image: Some(png("sky.png")),
            })
            .await
            .unwrap();

        service.delete_background(&background.id).await.unwrap();

        assert!(matches!(
            db::get_background(&service.db, &background.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_memory_is_not_found() {
        let service = service_with(Arc::new(InMemoryBlobStore::new())).await;
        assert!(matches!(
            service.delete_memory("missing").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_background_releases_previous_blob() {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let service = service_with(blobs.clone()).await;

        let original = service
            .create_background(BackgroundInput {
                background_type: Some("custom".into()),
                background_value: None,
                image: Some(png("old.png")),
            })
            .await
            .unwrap();
        let old_blob = original.background_value.clone();

        let replaced = service
            .replace_background(
                &original.id,
                BackgroundInput {
                    background_type: Some("custom".into()),
                    background_value: None,
                    image: Some(png("new.png")),
                },
            )
            .await
            .unwrap();

        assert_eq!(replaced.created_at, original.created_at);
        assert!(replaced.background_value.ends_with("-new.png"));
        assert!(!blobs.exists(&old_blob).await.unwrap());
        assert!(blobs.exists(&replaced.background_value).await.unwrap());

        // Switching to a preset drops the custom blob without storing anything.
        let preset = service
            .replace_background(
                &original.id,
                BackgroundInput {
                    background_type: Some("preset".into()),
                    background_value: Some("background2.jpg".into()),
                    image: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(preset.background_type, BackgroundType::Preset);
        assert!(blobs.is_empty().await);
    }

    #[rstest]
    #[case::missing_type(BackgroundInput::default(), "VALIDATION_ERROR")]
    #[case::unknown_type(
        BackgroundInput { background_type: Some("video".into()), ..Default::default() },
        "VALIDATION_ERROR"
    )]
    #[case::custom_without_image(
        BackgroundInput { background_type: Some("custom".into()), ..Default::default() },
        "VALIDATION_ERROR"
    )]
    #[case::preset_without_value(
        BackgroundInput { background_type: Some("preset".into()), ..Default::default() },
        "VALIDATION_ERROR"
    )]
    #[case::preset_with_image(
        BackgroundInput {
            background_type: Some("preset".into()),
            background_value: Some("background2.jpg".into()),
            image: Some(png("x.png")),
        },
        "VALIDATION_ERROR"
    )]
    #[case::not_an_image(
        BackgroundInput {
            background_type: Some("custom".into()),
            background_value: None,
            image: Some(Upload::new("notes.txt", Some("text/plain"), Bytes::from_static(b"hi"))),
        },
        "INVALID_FILE_TYPE"
    )]
    #[tokio::test]
    async fn test_background_validation(#[case] input: BackgroundInput, #[case] code: &str) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let service = service_with(blobs.clone()).await;

        let err = service.create_background(input).await.unwrap_err();
        assert_eq!(err.error_code(), code);
        assert!(blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_limits() {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        let service = AttachmentService::new(
            pool,
            blobs.clone(),
            Duration::from_secs(5),
            UploadLimits {
                max_file_size: 4,
                max_files_per_memory: 1,
            },
        );

        let err = service
            .create_memory(memory_input(vec![
                Upload::new("a.png", Some("image/png"), Bytes::from_static(b"ab")),
                Upload::new("b.png", Some("image/png"), Bytes::from_static(b"ab")),
            ]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = service
            .create_memory(memory_input(vec![Upload::new(
                "big.png",
                Some("image/png"),
                Bytes::from_static(b"too large"),
            )]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { max_size: 4 }));
        assert!(blobs.is_empty().await);
    }

    #[test]
    fn test_upload_content_type_fallback() {
        let guessed = Upload::new("photo.jpg", None, Bytes::new());
        assert_eq!(guessed.content_type, "image/jpeg");

        let generic = Upload::new("photo.png", Some("application/octet-stream"), Bytes::new());
        assert_eq!(generic.content_type, "image/png");

        let explicit = Upload::new("blob", Some("image/webp"), Bytes::new());
        assert_eq!(explicit.content_type, "image/webp");
    }

    #[rstest]
    #[case("2024-07-01T10:30:00Z", "2024-07-01T10:30:00Z")]
    #[case("2024-07-01T12:30:00+02:00", "2024-07-01T10:30:00Z")]
    #[case("2024-07-01T10:30", "2024-07-01T10:30:00Z")]
    #[case("2024-07-01T10:30:15", "2024-07-01T10:30:15Z")]
    #[case("2024-07-01", "2024-07-01T00:00:00Z")]
    fn test_parse_memory_date(#[case] input: &str, #[case] expected: &str) {
        let expected = DateTime::parse_from_rfc3339(expected)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_memory_date(input), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2024-13-01")]
    #[case("+12345-01-01")]
    #[case("12345-01-01T10:00")]
    #[case("-0001-01-01")]
    fn test_parse_memory_date_rejects(#[case] input: &str) {
        assert_eq!(parse_memory_date(input), None);
    }
}
