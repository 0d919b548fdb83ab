//! Status Routes
//!
//! Health checks, status endpoints, and metrics.
//!
//! Routes:
//! - GET /health - Basic health check
//! - GET /health/ready - Readiness check (database and blob store up)
//! - GET /health/live - Liveness check (server responding)
//! - GET /status - Detailed system status
//! - GET /metrics - Prometheus metrics endpoint

use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::services::ReconcileReport;
use crate::{db, AppState, Result};

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/live", get(liveness_check))
        .route("/status", get(system_status))
        .route("/metrics", get(prometheus_metrics))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<DependencyCheck>,
}

#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: Option<u64>,
    pub message: Option<String>,
}

/// System status response.
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub records: RecordCounts,
    pub blob_backend: String,
    pub metrics: SystemMetrics,
    pub last_sweep: Option<SweepSummary>,
}

#[derive(Debug, Serialize)]
pub struct RecordCounts {
    pub backgrounds: i64,
    pub messages: i64,
    pub memories: i64,
}

#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub total_requests: u64,
    pub total_errors: u64,
}

/// Counts from the most recent reconciliation sweep.
#[derive(Debug, Serialize)]
pub struct SweepSummary {
    pub finished_at: DateTime<Utc>,
    pub blobs: usize,
    pub references: usize,
    pub orphans: usize,
    pub dangling: usize,
    pub deleted: usize,
}

impl From<&ReconcileReport> for SweepSummary {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            finished_at: report.finished_at,
            blobs: report.blobs,
            references: report.references,
            orphans: report.orphans.len(),
            dangling: report.dangling.len(),
            deleted: report.deleted.len(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Basic health check.
///
/// GET /health
#[axum::debug_handler]
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "Server is running" }))
}

/// Readiness check.
///
/// GET /health/ready
///
/// Returns 503 if the database or the blob store cannot be reached.
#[axum::debug_handler]
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks = vec![check_database(&state).await, check_blob_store(&state).await];
    let ready = checks.iter().all(|c| c.status == HealthStatus::Healthy);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, checks }))
}

/// Liveness check.
///
/// GET /health/live
#[axum::debug_handler]
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Detailed system status.
///
/// GET /status
#[axum::debug_handler]
async fn system_status(State(state): State<AppState>) -> Result<Json<SystemStatusResponse>> {
    let records = RecordCounts {
        backgrounds: db::count_backgrounds(&state.db).await?,
        messages: db::count_messages(&state.db).await?,
        memories: db::count_memories(&state.db).await?,
    };

    let last_sweep = state
        .reconcile
        .last_report()
        .await
        .as_ref()
        .map(SweepSummary::from);

    Ok(Json(SystemStatusResponse {
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.metrics.uptime_seconds(),
        records,
        blob_backend: state.blobs.backend().into(),
        metrics: SystemMetrics {
            total_requests: state.metrics.requests(),
            total_errors: state.metrics.errors(),
        },
        last_sweep,
    }))
}

/// Prometheus metrics endpoint.
///
/// GET /metrics
#[axum::debug_handler]
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state
        .reconcile
        .last_report()
        .await
        .as_ref()
        .map(SweepSummary::from);
    let (orphans, dangling, deleted) = summary
        .map(|s| (s.orphans, s.dangling, s.deleted))
        .unwrap_or_default();

    let metrics = format!(
        r#"# HELP keepsake_requests_total Total number of HTTP requests
# TYPE keepsake_requests_total counter
keepsake_requests_total {}

# HELP keepsake_errors_total Total number of requests answered with a server error
# TYPE keepsake_errors_total counter
keepsake_errors_total {}

# HELP keepsake_uptime_seconds Seconds since the server started
# TYPE keepsake_uptime_seconds gauge
keepsake_uptime_seconds {}

# HELP keepsake_reconcile_orphans Orphaned blobs found by the last sweep
# TYPE keepsake_reconcile_orphans gauge
keepsake_reconcile_orphans {}

# HELP keepsake_reconcile_dangling Dangling references found by the last sweep
# TYPE keepsake_reconcile_dangling gauge
keepsake_reconcile_dangling {}

# HELP keepsake_reconcile_deleted Orphans deleted by the last sweep
# TYPE keepsake_reconcile_deleted gauge
keepsake_reconcile_deleted {}

# HELP keepsake_up Whether the service is up
# TYPE keepsake_up gauge
keepsake_up 1
"#,
        state.metrics.requests(),
        state.metrics.errors(),
        state.metrics.uptime_seconds(),
        orphans,
        dangling,
        deleted,
    );

    (
        StatusCode::OK,
        [(
            "Content-Type",
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check database connectivity.
async fn check_database(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let result = db::health_check(&state.db).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(()) => (HealthStatus::Healthy, None),
        Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
    };

    DependencyCheck {
        name: "database".into(),
        status,
        latency_ms: Some(latency_ms),
        message,
    }
}

/// Check the blob store answers a lookup.
async fn check_blob_store(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let result = state.blobs.exists("readiness-probe").await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (HealthStatus::Healthy, None),
        Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
    };

    DependencyCheck {
        name: format!("blobs ({})", state.blobs.backend()),
        status,
        latency_ms: Some(latency_ms),
        message,
    }
}
