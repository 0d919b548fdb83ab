//! Application state for keepsake.
//!
//! Contains the shared state that is passed to all handlers. Everything is
//! built explicitly from a [`Config`] at startup and torn down with
//! [`AppState::close`]; nothing lives in globals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use keepsake_blob::{BlobStore, FilesystemBlobStore, InMemoryBlobStore};
use tracing::info;

use crate::config::{BlobBackend, Config, StorageConfig, UploadLimits};
use crate::db::{self, DbPool};
use crate::services::{AttachmentService, PresenceService, ReconcileService};
use crate::Result;

/// Request counters exposed on `/status` and `/metrics`.
#[derive(Debug)]
pub struct RequestMetrics {
    started: Instant,
    requests: AtomicU64,
    errors: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Blob store holding uploaded images.
    pub blobs: Arc<dyn BlobStore>,
    /// Record/blob coordinator.
    pub attachments: AttachmentService,
    /// Seen-by tracking.
    pub presence: PresenceService,
    /// Reconciliation sweep.
    pub reconcile: ReconcileService,
    pub limits: UploadLimits,
    pub metrics: Arc<RequestMetrics>,
}

impl AppState {
    /// Open the database, bootstrap the schema, and build the blob store.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::init_pool(&config.database.path).await?;
        db::initialize_schema(&db).await?;

        let blobs = build_blob_store(&config.storage).await?;

        Ok(Self::with_stores(db, blobs, config))
    }

    /// Build state around stores that are already open.
    pub fn with_stores(db: DbPool, blobs: Arc<dyn BlobStore>, config: &Config) -> Self {
        let limits = config.storage.limits;

        let attachments = AttachmentService::new(
            db.clone(),
            blobs.clone(),
            config.operations.timeout,
            limits,
        );
        let presence = PresenceService::new(db.clone());
        let reconcile = ReconcileService::new(db.clone(), blobs.clone(), config.reconcile.orphan_grace);

        Self {
            db,
            blobs,
            attachments,
            presence,
            reconcile,
            limits,
            metrics: Arc::new(RequestMetrics::new()),
        }
    }

    /// Close the database pool. In-flight queries finish first.
    pub async fn close(&self) {
        self.db.close().await;
        info!("Database pool closed");
    }
}

/// Build the configured blob store, validating it can be written.
pub async fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        BlobBackend::Filesystem => {
            let store = FilesystemBlobStore::new(&config.uploads_path);
            store.validate().await?;
            info!(path = %store.root().display(), "Filesystem blob store ready");
            Ok(Arc::new(store))
        }
        BlobBackend::Memory => {
            info!("In-memory blob store ready (contents are lost on restart)");
            Ok(Arc::new(InMemoryBlobStore::new()))
        }
    }
}
