//! Liveness and readiness probes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use cigate_core::{HealthReport, HealthStatus};
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness: the process is up and serving.
pub async fn live() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness: job configuration and backend reachability.
///
/// Degraded still counts as ready; only an unhealthy report returns 503.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.gateway.health().await;
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(report))
}
