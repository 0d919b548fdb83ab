//! API Routes for keepsake
//!
//! This module combines all routes into a single router.
//!
//! Route structure:
//! - /api/backgrounds, /api/background/* - Backgrounds
//! - /api/messages/* - Messages and seen-marking
//! - /api/memories/* - Memories with photos
//! - /uploads/:name - Stored images
//! - /health, /status, /metrics - Health checks

mod backgrounds;
mod form;
mod memories;
mod messages;
pub mod status;
mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::track_requests;
use crate::AppState;

/// Build the complete route table.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .nest("/api", api_routes(&state))
        .merge(uploads::routes())
        .layer(axum::middleware::from_fn_with_state(state, track_requests))
}

/// Record routes. Upload routes need a body limit that fits a full memory.
fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(backgrounds::routes())
        .merge(messages::routes())
        .merge(memories::routes())
        .layer(DefaultBodyLimit::max(state.limits.max_request_size()))
}

/// Build the application: routes, tracing, and a permissive CORS policy.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
