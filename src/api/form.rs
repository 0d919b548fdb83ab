//! Multipart form helpers shared by the upload routes.

use axum::extract::multipart::Field;
use axum::extract::Multipart;

use crate::services::Upload;
use crate::{Error, Result};

/// Next multipart field, with read failures reported as invalid input.
pub(super) async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>> {
    multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read multipart field: {}", e)))
}

/// Read a text field.
pub(super) async fn read_text(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read form field: {}", e)))
}

/// Read a file field.
///
/// Browsers submit an empty, unnamed part for a file input left blank;
/// that reads as no file at all.
pub(super) async fn read_upload(field: Field<'_>) -> Result<Option<Upload>> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    let data = field
        .bytes()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read file: {}", e)))?;

    if filename.is_empty() && data.is_empty() {
        return Ok(None);
    }

    let filename = if filename.is_empty() {
        "upload".to_string()
    } else {
        filename
    };

    Ok(Some(Upload::new(filename, content_type.as_deref(), data)))
}
