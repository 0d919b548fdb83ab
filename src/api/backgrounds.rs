//! Background Routes
//!
//! Routes:
//! - GET /api/backgrounds - List every background, newest first
//! - GET /api/background - The active background (or the default preset)
//! - POST /api/background - Create a background
//! - PUT /api/background/:id - Replace a background's setting
//! - DELETE /api/background/:id - Delete a background and its image
//!
//! Create and replace take `multipart/form-data` with the fields
//! `backgroundType`, `backgroundValue` and `backgroundImage`. A preset can
//! also be sent as a JSON body with the first two fields.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::form::{next_field, read_text, read_upload};
use crate::models::{ActiveBackground, Background};
use crate::services::BackgroundInput;
use crate::{db, AppState, Result};

/// Build background routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/backgrounds", get(list_backgrounds))
        .route("/background", get(get_active_background).post(create_background))
        .route("/background/:id", put(replace_background).delete(delete_background))
}

// ============================================================================
// Request Types
// ============================================================================

/// JSON form of a background setting (presets only).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackgroundJson {
    background_type: Option<String>,
    background_value: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/backgrounds
#[axum::debug_handler]
async fn list_backgrounds(State(state): State<AppState>) -> Result<Json<Vec<Background>>> {
    let backgrounds = db::list_backgrounds(&state.db).await?;
    Ok(Json(backgrounds))
}

/// GET /api/background
///
/// Never 404s: with no backgrounds stored, the default preset is returned.
#[axum::debug_handler]
async fn get_active_background(State(state): State<AppState>) -> Result<Json<ActiveBackground>> {
    let latest = db::get_latest_background(&state.db).await?;
    Ok(Json(ActiveBackground::from_latest(latest)))
}

/// POST /api/background
#[axum::debug_handler]
async fn create_background(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<Background>> {
    let input = read_background(req).await?;
    let background = state.attachments.create_background(input).await?;
    Ok(Json(background))
}

/// PUT /api/background/:id
#[axum::debug_handler]
async fn replace_background(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<Json<Background>> {
    let input = read_background(req).await?;
    let background = state.attachments.replace_background(&id, input).await?;
    Ok(Json(background))
}

/// DELETE /api/background/:id
#[axum::debug_handler]
async fn delete_background(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.attachments.delete_background(&id).await?;
    Ok(Json(json!({ "message": "Background deleted successfully" })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a background setting from either a JSON or a multipart body.
async fn read_background(req: Request) -> Result<BackgroundInput> {
    let is_json = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        let Json(body) = Json::<BackgroundJson>::from_request(req, &()).await?;
        return Ok(BackgroundInput {
            background_type: body.background_type,
            background_value: body.background_value,
            image: None,
        });
    }

    let mut multipart = Multipart::from_request(req, &()).await?;

    let mut input = BackgroundInput::default();
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "backgroundType" => input.background_type = Some(read_text(field).await?),
            "backgroundValue" => input.background_value = Some(read_text(field).await?),
            "backgroundImage" => input.image = read_upload(field).await?,
            _ => {}
        }
    }

    Ok(input)
}
