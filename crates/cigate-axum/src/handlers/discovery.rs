//! Backend discovery: teams, pipelines, jobs and builds.

use std::num::IntErrorKind;

use axum::Json;
use axum::extract::{Path, Query, State};
use cigate_core::{BuildDetails, BuildInfo, PipelineInfo, PipelineJobInfo, TeamInfo};
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::filters::{JobQuery, PipelineQuery, filter_jobs, filter_pipelines};
use crate::state::AppState;

pub const DEFAULT_BUILD_LIMIT: u32 = 20;
pub const MAX_BUILD_LIMIT: u32 = 100;

#[derive(Debug, Serialize)]
pub struct TeamsResponse {
    pub teams: Vec<TeamInfo>,
}

#[derive(Debug, Serialize)]
pub struct PipelinesResponse {
    pub pipelines: Vec<PipelineInfo>,
}

#[derive(Debug, Serialize)]
pub struct PipelineJobsResponse {
    pub jobs: Vec<PipelineJobInfo>,
}

#[derive(Debug, Serialize)]
pub struct BuildsResponse {
    pub builds: Vec<BuildInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuildsQuery {
    pub team: Option<String>,
    pub limit: Option<String>,
}

/// Absent, unparsable or non-positive values fall back to the default;
/// values above the maximum are clamped.
pub fn parse_limit(raw: Option<&str>) -> u32 {
    let Some(s) = raw.filter(|s| !s.is_empty()) else {
        return DEFAULT_BUILD_LIMIT;
    };
    match s.parse::<i64>() {
        Ok(n) if n > 0 => u32::try_from(n).map_or(MAX_BUILD_LIMIT, |n| n.min(MAX_BUILD_LIMIT)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => MAX_BUILD_LIMIT,
        _ => DEFAULT_BUILD_LIMIT,
    }
}

fn team(raw: Option<&String>) -> Option<&str> {
    raw.map(String::as_str).filter(|t| !t.is_empty())
}

pub async fn teams(State(state): State<AppState>) -> Result<Json<TeamsResponse>, HttpError> {
    Ok(Json(TeamsResponse {
        teams: state.gateway.list_teams().await?,
    }))
}

pub async fn pipelines(
    State(state): State<AppState>,
    Query(query): Query<PipelineQuery>,
) -> Result<Json<PipelinesResponse>, HttpError> {
    let pipelines = state
        .gateway
        .list_pipelines(team(query.team.as_ref()))
        .await?;
    Ok(Json(PipelinesResponse {
        pipelines: filter_pipelines(pipelines, &query),
    }))
}

pub async fn pipeline_jobs(
    State(state): State<AppState>,
    Path(pipeline): Path<String>,
    Query(query): Query<JobQuery>,
) -> Result<Json<PipelineJobsResponse>, HttpError> {
    let jobs = state
        .gateway
        .list_pipeline_jobs(team(query.team.as_ref()), &pipeline)
        .await?;
    Ok(Json(PipelineJobsResponse {
        jobs: filter_jobs(jobs, &query),
    }))
}

pub async fn job_builds(
    State(state): State<AppState>,
    Path((pipeline, job)): Path<(String, String)>,
    Query(query): Query<BuildsQuery>,
) -> Result<Json<BuildsResponse>, HttpError> {
    let limit = parse_limit(query.limit.as_deref());
    let builds = state
        .gateway
        .list_job_builds(team(query.team.as_ref()), &pipeline, &job, limit)
        .await?;
    Ok(Json(BuildsResponse { builds }))
}

pub async fn build_details(
    State(state): State<AppState>,
    Path(build_id): Path<String>,
) -> Result<Json<BuildDetails>, HttpError> {
    let build_id = build_id
        .parse::<u64>()
        .map_err(|_| HttpError::BadRequest("invalid build_id".to_string()))?;
    Ok(Json(state.gateway.get_build_details(build_id).await?))
}
