//! Error types for keepsake-blob.

pub type Result<T> = std::result::Result<T, BlobError>;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The name is not a plain, single-component blob name.
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    /// Backend failure that is not an IO error
    #[error("Blob storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
