//! Conversion from Concourse wire types to core domain types.

use chrono::{DateTime, Utc};
use cigate_core::{BuildInfo, PipelineInfo, PipelineJobInfo, Run, RunStatus, TeamInfo};

use crate::models::{BuildDto, JobDto, PipelineDto, TeamDto};
use crate::reference::ConcourseRunRef;

pub fn map_status(status: &str) -> RunStatus {
    match status {
        "pending" => RunStatus::Queued,
        "started" => RunStatus::Running,
        "succeeded" => RunStatus::Succeeded,
        "failed" => RunStatus::Failed,
        "aborted" => RunStatus::Canceled,
        "errored" => RunStatus::Errored,
        _ => RunStatus::Unknown,
    }
}

/// Unix seconds to UTC; zero, negative and absent values are unset.
pub fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.filter(|s| *s > 0)
        .and_then(|s| DateTime::from_timestamp(s, 0))
}

/// `created_at` falls back to the start time, then to `now`.
pub fn to_run(run_ref: &ConcourseRunRef, build: &BuildDto, now: DateTime<Utc>) -> Run {
    let started_at = timestamp(build.start_time);
    Run {
        run_id: run_ref.to_string(),
        job_id: None,
        status: map_status(&build.status),
        created_at: timestamp(build.create_time).or(started_at).unwrap_or(now),
        started_at,
        finished_at: timestamp(build.end_time),
    }
}

pub fn to_build_info(build: BuildDto) -> BuildInfo {
    BuildInfo {
        id: build.id,
        name: build.name,
        status: build.status,
        team: build.team_name,
        pipeline: build.pipeline_name,
        job: build.job_name,
        created_at: timestamp(build.create_time),
        started_at: timestamp(build.start_time),
        finished_at: timestamp(build.end_time),
    }
}

pub fn to_team_info(team: TeamDto) -> TeamInfo {
    TeamInfo {
        id: team.id,
        name: team.name,
    }
}

pub fn to_pipeline_info(pipeline: PipelineDto) -> PipelineInfo {
    PipelineInfo {
        id: pipeline.id,
        name: pipeline.name,
        team: pipeline.team_name,
        paused: pipeline.paused,
        archived: pipeline.archived,
        public: pipeline.public,
    }
}

pub fn to_job_info(job: JobDto) -> PipelineJobInfo {
    PipelineJobInfo {
        id: job.id,
        name: job.name,
        pipeline: job.pipeline_name,
        team: job.team_name,
        paused: job.paused,
        next_build: job.next_build.map(to_build_info),
        finished_build: job.finished_build.map(to_build_info),
    }
}
