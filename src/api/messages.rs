//! Message Routes
//!
//! Routes:
//! - GET /api/messages - List messages, newest first
//! - POST /api/messages - Create a message
//! - POST /api/messages/seen/:id - Mark a message seen by a viewer
//! - DELETE /api/messages/:id - Delete a message
//!
//! Messages carry no attachments, so these go straight to the record store
//! (seen-marking through the presence tracker).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{self, CreateMessage};
use crate::models::{new_id, Message};
use crate::{AppState, Error, Result};

/// Build message routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages).post(create_message))
        .route("/messages/seen/:id", post(mark_seen))
        .route("/messages/:id", delete(delete_message))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub sender: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkSeenRequest {
    pub username: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/messages
#[axum::debug_handler]
async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>> {
    let messages = db::list_messages(&state.db).await?;
    Ok(Json(messages))
}

/// POST /api/messages
#[axum::debug_handler]
async fn create_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<Json<Message>> {
    let Json(request) = payload?;
    let sender = request
        .sender
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::missing_field("sender"))?;
    let content = request
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::missing_field("content"))?;

    let message = db::create_message(
        &state.db,
        CreateMessage {
            id: new_id(),
            sender,
            content,
        },
    )
    .await?;

    Ok(Json(message))
}

/// POST /api/messages/seen/:id
#[axum::debug_handler]
async fn mark_seen(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<MarkSeenRequest>, JsonRejection>,
) -> Result<Json<Message>> {
    let Json(request) = payload?;
    let viewer = request.username.unwrap_or_default();
    let message = state.presence.mark_seen(&id, &viewer).await?;
    Ok(Json(message))
}

/// DELETE /api/messages/:id
#[axum::debug_handler]
async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    db::delete_message(&state.db, &id).await?;
    Ok(Json(json!({ "message": "Message deleted successfully" })))
}
