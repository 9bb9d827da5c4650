//! Run status, event streaming and cancellation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;

use super::jobs::RunResponse;
use crate::error::HttpError;
use crate::request_id::request_id;
use crate::sse;
use crate::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunResponse>, HttpError> {
    let run = state.gateway.get_run(&run_id).await?;
    Ok(Json(RunResponse { run }))
}

/// Stream run events as SSE.
///
/// A malformed run id is rejected with a JSON 404 before the stream opens;
/// failures after that end the stream with an `event: error` frame.
pub async fn events(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    state.gateway.check_run_id(&run_id)?;
    Ok(sse::stream_run(
        Arc::clone(&state.gateway),
        run_id,
        request_id(&headers),
    ))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.gateway.cancel_run(&run_id).await?;
    tracing::info!(run_id = %run_id, "Run cancelled");
    Ok(StatusCode::NO_CONTENT)
}
