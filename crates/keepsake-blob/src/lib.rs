//! Blob storage for keepsake attachments.
//!
//! Uploaded images live outside the record database, addressed by a
//! store-assigned name. Records hold those names as plain strings; the
//! store itself keeps no back-reference to its owners.
//!
//! Two backends are provided:
//! - [`FilesystemBlobStore`] - a flat directory, one file per blob
//! - [`InMemoryBlobStore`] - a process-local map for ephemeral deployments
//!
//! Names follow the pattern `{unix_millis}-{nonce}-{original}`:
//! ```
//! use keepsake_blob::naming::generate_blob_name;
//! let name = generate_blob_name("beach day.jpg");
//! assert!(name.ends_with("-beach_day.jpg"));
//! ```

mod error;
mod fs;
mod memory;
pub mod naming;
mod store;

pub use error::{BlobError, Result};
pub use fs::FilesystemBlobStore;
pub use memory::InMemoryBlobStore;
pub use store::{BlobInfo, BlobStore};
