//! Configured job listing and run triggering.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cigate_core::{Job, Run, TriggerParams};
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run: Run,
}

/// List all configured jobs.
pub async fn list(State(state): State<AppState>) -> Json<JobsResponse> {
    Json(JobsResponse {
        jobs: state.gateway.list_jobs(),
    })
}

/// Trigger a run of a configured job.
pub async fn trigger(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    body: Result<Json<TriggerParams>, JsonRejection>,
) -> Result<(StatusCode, Json<RunResponse>), HttpError> {
    let Json(params) = body.map_err(|rejection| {
        tracing::warn!(job_id = %job_id, error = %rejection, "Invalid trigger request body");
        HttpError::BadRequest("invalid request body".to_string())
    })?;

    tracing::debug!(
        job_id = %job_id,
        idempotency_key = params.idempotency_key.as_deref(),
        "Triggering run"
    );
    let run = state.gateway.trigger_run(&job_id, params).await?;
    Ok((StatusCode::CREATED, Json(RunResponse { run })))
}
