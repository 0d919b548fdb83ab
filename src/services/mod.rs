//! Service layer for keepsake.
//!
//! - Attachments (records and the blobs they reference, kept in step)
//! - Presence (seen-by tracking on messages)
//! - Reconcile (out-of-band sweep for orphaned blobs and dangling references)

mod attachments;
mod presence;
mod reconcile;

pub use attachments::{parse_memory_date, AttachmentService, BackgroundInput, MemoryInput, Upload};
pub use presence::PresenceService;
pub use reconcile::{start_reconcile_task, ReconcileReport, ReconcileService, SweepMode};
