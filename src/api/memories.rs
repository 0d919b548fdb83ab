//! Memory Routes
//!
//! Routes:
//! - GET /api/memories - List memories, most recent `date` first
//! - POST /api/memories - Create a memory with its photos
//! - DELETE /api/memories/:id - Delete a memory and its photos
//!
//! Create takes `multipart/form-data` with the text fields `title`,
//! `description`, `date` and `sender`, and one `images` part per photo.
//! Photos keep the order they were sent in.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};

use super::form::{next_field, read_text, read_upload};
use crate::models::Memory;
use crate::services::MemoryInput;
use crate::{db, AppState, Result};

/// Build memory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/memories", get(list_memories).post(create_memory))
        .route("/memories/:id", delete(delete_memory))
}

/// GET /api/memories
#[axum::debug_handler]
async fn list_memories(State(state): State<AppState>) -> Result<Json<Vec<Memory>>> {
    let memories = db::list_memories(&state.db).await?;
    Ok(Json(memories))
}

/// POST /api/memories
#[axum::debug_handler]
async fn create_memory(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Memory>> {
    let mut multipart = multipart?;
    let mut input = MemoryInput::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => input.title = Some(read_text(field).await?),
            "description" => input.description = Some(read_text(field).await?),
            "date" => input.date = Some(read_text(field).await?),
            "sender" => input.sender = Some(read_text(field).await?),
            "images" | "images[]" => {
                if let Some(upload) = read_upload(field).await? {
                    input.images.push(upload);
                }
            }
            _ => {}
        }
    }

    let memory = state.attachments.create_memory(input).await?;
    Ok(Json(memory))
}

/// DELETE /api/memories/:id
#[axum::debug_handler]
async fn delete_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.attachments.delete_memory(&id).await?;
    Ok(Json(json!({ "message": "Memory deleted successfully" })))
}
