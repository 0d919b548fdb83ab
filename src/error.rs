//! Error types for keepsake.
//!
//! Uses thiserror for ergonomic error definitions that integrate
//! with axum's response system. Every failure carries a stable code
//! so clients can branch on the kind rather than the message.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keepsake_blob::BlobError;
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: max {max_size} bytes")]
    FileTooLarge { max_size: usize },

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    // Store errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 404
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 400
            Self::Validation(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,

            // 413
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            // 415
            Self::InvalidFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            // 504
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500
            Self::Database(_) | Self::Blob(_) | Self::Internal(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::InvalidFileType(_) => "INVALID_FILE_TYPE",
            Self::Database(_) => "STORE_FAILURE",
            Self::Blob(_) => "BLOB_FAILURE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for a missing-field validation failure.
    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("{} is required", field))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("JSON parsing error: {}", err))
    }
}
