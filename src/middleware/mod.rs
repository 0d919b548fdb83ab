//! Middleware for keepsake.
//!
//! Every route is open; there is no authentication layer. This holds the
//! request accounting behind `/status` and `/metrics`.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Count every request, and every request answered with a server error.
pub async fn track_requests(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    state.metrics.record_request();

    let response = next.run(req).await;
    if response.status().is_server_error() {
        state.metrics.record_error();
    }

    response
}
