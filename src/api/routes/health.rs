//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 if the activity log file is reachable.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_log_health(&state).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let log_ok = check_log_health(&state).await;
    let logged_events = state.activity_log.lock().await.entry_count();

    Json(HealthResponse {
        status: (if log_ok { "healthy" } else { "unhealthy" }).to_string(),
        activity_log: (if log_ok { "ok" } else { "error" }).to_string(),
        logged_events,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The log is healthy if its file can still be stat'ed
async fn check_log_health(state: &AppState) -> bool {
    let log = state.activity_log.lock().await;
    match log.file_size() {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(path = ?log.path(), error = %e, "Activity log unavailable");
            false
        }
    }
}
