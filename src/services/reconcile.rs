//! Reconciliation sweep.
//!
//! Records reference blobs by name only, so drift between the two stores
//! can only be found by comparing them:
//!
//! - an **orphan** is a stored blob no record references
//! - a **dangling** reference is a record naming a blob that is not stored
//!
//! Orphans older than the grace period can be deleted. Dangling references
//! are only reported; there is nothing to restore them from.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use keepsake_blob::BlobStore;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::db::{self, DbPool};
use crate::error::Result;
use crate::models::BlobReference;

/// What a sweep is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepMode {
    /// Find drift, change nothing.
    Report,
    /// Also delete orphans past the grace period.
    Repair,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub mode: SweepMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Blobs present in the store.
    pub blobs: usize,
    /// References held by records.
    pub references: usize,
    pub orphans: Vec<String>,
    pub dangling: Vec<BlobReference>,
    /// Orphans deleted by this sweep (repair mode only).
    pub deleted: Vec<String>,
}

/// Compares record references against the blob store.
#[derive(Clone)]
pub struct ReconcileService {
    db: DbPool,
    blobs: Arc<dyn BlobStore>,
    orphan_grace: Duration,
    last_report: Arc<RwLock<Option<ReconcileReport>>>,
}

impl ReconcileService {
    pub fn new(db: DbPool, blobs: Arc<dyn BlobStore>, orphan_grace: Duration) -> Self {
        Self {
            db,
            blobs,
            orphan_grace,
            last_report: Arc::new(RwLock::new(None)),
        }
    }

    /// Report of the most recent completed sweep.
    pub async fn last_report(&self) -> Option<ReconcileReport> {
        self.last_report.read().await.clone()
    }

    /// Run one sweep.
    ///
    /// References are read before the blob listing. A create in flight has
    /// its blobs stored before its record, so it can show up as an orphan
    /// here but never as dangling; the grace period keeps it from being
    /// deleted.
    pub async fn sweep(&self, mode: SweepMode) -> Result<ReconcileReport> {
        let started_at = Utc::now();

        let references = self.references().await?;
        let stored = self.blobs.list().await?;

        let referenced: HashSet<&str> = references.iter().map(|r| r.blob.as_str()).collect();
        let stored_names: HashSet<&str> = stored.iter().map(|b| b.name.as_str()).collect();

        let orphans: Vec<_> = stored
            .iter()
            .filter(|blob| !referenced.contains(blob.name.as_str()))
            .collect();

        // A record deleted between the two reads would look dangling, so
        // only references still present after the listing count.
        let current = self.references().await?;
        let dangling: Vec<BlobReference> = current
            .into_iter()
            .filter(|r| referenced.contains(r.blob.as_str()))
            .filter(|r| !stored_names.contains(r.blob.as_str()))
            .collect();

        let mut deleted = Vec::new();
        if mode == SweepMode::Repair {
            for blob in &orphans {
                let age = started_at
                    .signed_duration_since(blob.created_at)
                    .to_std()
                    .unwrap_or_default();
                if age < self.orphan_grace {
                    debug!(blob = %blob.name, "Orphan within grace period, keeping");
                    continue;
                }
                match self.blobs.delete(&blob.name).await {
                    Ok(_) => {
                        info!(blob = %blob.name, size = blob.size_bytes, "Deleted orphaned blob");
                        deleted.push(blob.name.clone());
                    }
                    Err(e) => warn!(blob = %blob.name, error = %e, "Orphan delete failed"),
                }
            }
        }

        for reference in &dangling {
            warn!(
                owner = reference.owner.as_str(),
                owner_id = %reference.owner_id,
                blob = %reference.blob,
                "Dangling blob reference"
            );
        }

        let report = ReconcileReport {
            mode,
            started_at,
            finished_at: Utc::now(),
            blobs: stored.len(),
            references: references.len(),
            orphans: orphans.iter().map(|b| b.name.clone()).collect(),
            dangling,
            deleted,
        };

        info!(
            blobs = report.blobs,
            references = report.references,
            orphans = report.orphans.len(),
            dangling = report.dangling.len(),
            deleted = report.deleted.len(),
            "Reconciliation sweep finished"
        );

        *self.last_report.write().await = Some(report.clone());
        Ok(report)
    }

    async fn references(&self) -> Result<Vec<BlobReference>> {
        let mut references = db::list_background_blob_refs(&self.db).await?;
        references.extend(db::list_memory_blob_refs(&self.db).await?);
        Ok(references)
    }
}

/// Spawn the periodic sweep. The first sweep runs immediately.
pub fn start_reconcile_task(
    service: ReconcileService,
    interval: Duration,
    mode: SweepMode,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), ?mode, "Starting reconciliation task");

    tokio::spawn(async move {
        loop {
            if let Err(e) = service.sweep(mode).await {
                error!(error = %e, "Reconciliation sweep failed");
            }
            tokio::time::sleep(interval).await;
        }
    })
}
