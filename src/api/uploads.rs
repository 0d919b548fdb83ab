//! Upload Routes
//!
//! Routes:
//! - GET /uploads/:name - Serve a stored image
//!
//! Names are the blob names held in records. Anything that is not a plain
//! single-component name (`..`, separators, leading dot) is a 404.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
    routing::get,
    Router,
};
use keepsake_blob::BlobError;

use crate::{AppState, Error, Result};

/// Build upload routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/uploads/:name", get(serve_upload))
}

/// GET /uploads/:name
#[axum::debug_handler]
async fn serve_upload(State(state): State<AppState>, Path(name): Path<String>) -> Result<Response> {
    let found = match state.blobs.get(&name).await {
        Ok(found) => found,
        Err(BlobError::InvalidName(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let (info, data) = found.ok_or_else(|| Error::NotFound("Upload".into()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, &info.content_type)
        .header(header::CONTENT_LENGTH, data.len())
        // Blob names are never reused, so the content behind one never changes.
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(data))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}
