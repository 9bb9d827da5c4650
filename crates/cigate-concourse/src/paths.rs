//! Concourse API path construction.
//!
//! Paths are relative (no leading slash) so they join underneath a base URL
//! that may itself carry a path prefix. Every caller-controlled segment is
//! percent-encoded. `.` and `..` are rejected: URL joining resolves them even
//! when percent-encoded.

use std::borrow::Cow;

use urlencoding::encode;

use crate::error::{ConcourseError, ConcourseResult};

/// Password-grant token endpoint of the `sky` issuer.
pub const TOKEN_PATH: &str = "sky/issuer/token";

/// Unauthenticated-safe server info, used as a health probe.
pub const INFO_PATH: &str = "api/v1/info";

pub const TEAMS_PATH: &str = "api/v1/teams";

/// True for names that URL resolution treats as dot segments.
pub fn is_dot_segment(name: &str) -> bool {
    matches!(name, "." | "..")
}

fn segment(name: &str) -> ConcourseResult<Cow<'_, str>> {
    if is_dot_segment(name) {
        return Err(ConcourseError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(encode(name))
}

pub fn pipelines_path(team: &str) -> ConcourseResult<String> {
    Ok(format!("api/v1/teams/{}/pipelines", segment(team)?))
}

pub fn jobs_path(team: &str, pipeline: &str) -> ConcourseResult<String> {
    Ok(format!("{}/{}/jobs", pipelines_path(team)?, segment(pipeline)?))
}

/// Create-build (POST) and list-builds (GET) share this path.
pub fn job_builds_path(team: &str, pipeline: &str, job: &str) -> ConcourseResult<String> {
    Ok(format!("{}/{}/builds", jobs_path(team, pipeline)?, segment(job)?))
}

pub fn job_builds_with_limit_path(
    team: &str,
    pipeline: &str,
    job: &str,
    limit: u32,
) -> ConcourseResult<String> {
    Ok(format!("{}?limit={limit}", job_builds_path(team, pipeline, job)?))
}

pub fn build_path(build_id: u64) -> String {
    format!("api/v1/builds/{build_id}")
}

pub fn build_abort_path(build_id: u64) -> String {
    format!("{}/abort", build_path(build_id))
}

pub fn build_events_path(build_id: u64) -> String {
    format!("{}/events", build_path(build_id))
}

pub fn build_plan_path(build_id: u64) -> String {
    format!("{}/plan", build_path(build_id))
}
