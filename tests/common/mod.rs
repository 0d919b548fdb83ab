//! Common test utilities and helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::multipart::Part;
use axum_test::TestServer;
use bytes::Bytes;
use keepsake::config::{BlobBackend, Config};
use keepsake::db::{self, DbPool};
use keepsake::{api, AppState};
use keepsake_blob::{BlobError, BlobInfo, BlobStore, InMemoryBlobStore};

// ============================================================================
// Fault-injecting blob store
// ============================================================================

/// In-memory blob store that can be told to fail or stall.
#[derive(Default)]
pub struct FlakyBlobStore {
    inner: InMemoryBlobStore,
    puts: AtomicUsize,
    /// 1-based number of the put that fails (0 = none).
    fail_put_at: AtomicUsize,
    fail_deletes: AtomicBool,
    stall_puts: Option<Duration>,
}

impl FlakyBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every put sleeps for `delay` before doing anything.
    pub fn stalling(delay: Duration) -> Self {
        Self {
            stall_puts: Some(delay),
            ..Self::default()
        }
    }

    /// Fail the `n`th put from now on (1-based).
    pub fn fail_put_number(&self, n: usize) {
        self.puts.store(0, Ordering::SeqCst);
        self.fail_put_at.store(n, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    pub async fn names(&self) -> Vec<String> {
        self.inner
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect()
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn put(&self, filename: &str, content_type: &str, data: Bytes) -> keepsake_blob::Result<BlobInfo> {
        if let Some(delay) = self.stall_puts {
            tokio::time::sleep(delay).await;
        }

        let number = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if number == self.fail_put_at.load(Ordering::SeqCst) {
            return Err(BlobError::Storage(format!("injected failure on put {}", number)));
        }

        self.inner.put(filename, content_type, data).await
    }

    async fn get(&self, name: &str) -> keepsake_blob::Result<Option<(BlobInfo, Bytes)>> {
        self.inner.get(name).await
    }

    async fn delete(&self, name: &str) -> keepsake_blob::Result<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Storage("injected delete failure".into()));
        }
        self.inner.delete(name).await
    }

    async fn exists(&self, name: &str) -> keepsake_blob::Result<bool> {
        self.inner.exists(name).await
    }

    async fn list(&self) -> keepsake_blob::Result<Vec<BlobInfo>> {
        self.inner.list().await
    }
}

// ============================================================================
// Test app
// ============================================================================

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub blobs: Arc<FlakyBlobStore>,
}

impl TestApp {
    pub fn db(&self) -> &DbPool {
        &self.state.db
    }
}

/// Configuration for tests: in-memory stores, no orphan grace period.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.database.path = ":memory:".into();
    config.storage.backend = BlobBackend::Memory;
    config.operations.timeout = Duration::from_secs(5);
    config.reconcile.orphan_grace = Duration::ZERO;
    config
}

/// Build a test app over a fresh database and a well-behaved blob store.
pub async fn build_test_app() -> TestApp {
    build_test_app_with(FlakyBlobStore::new(), test_config()).await
}

pub async fn build_test_app_with(blobs: FlakyBlobStore, config: Config) -> TestApp {
    let pool = db::init_pool(":memory:")
        .await
        .expect("Failed to create test database");
    db::initialize_schema(&pool)
        .await
        .expect("Failed to initialize schema");

    let blobs = Arc::new(blobs);
    let state = AppState::with_stores(pool, blobs.clone(), &config);
    let server = TestServer::new(api::router(state.clone())).expect("Failed to create test server");

    TestApp {
        server,
        state,
        blobs,
    }
}

/// A small PNG-typed multipart part.
pub fn image_part(filename: &str) -> Part {
    Part::bytes(format!("image bytes of {}", filename).into_bytes())
        .file_name(filename)
        .mime_type("image/png")
}
