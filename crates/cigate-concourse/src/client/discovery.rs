//! Read-only listing endpoints.

use super::ConcourseClient;
use crate::error::ConcourseResult;
use crate::http::HttpBackend;
use crate::models::{BuildDto, JobDto, PipelineDto, TeamDto};
use crate::paths;

impl<B: HttpBackend> ConcourseClient<B> {
    pub async fn list_teams(&self) -> ConcourseResult<Vec<TeamDto>> {
        self.get_json(paths::TEAMS_PATH).await
    }

    pub async fn list_pipelines(&self, team: &str) -> ConcourseResult<Vec<PipelineDto>> {
        self.get_json(&paths::pipelines_path(team)?).await
    }

    pub async fn list_jobs(&self, team: &str, pipeline: &str) -> ConcourseResult<Vec<JobDto>> {
        self.get_json(&paths::jobs_path(team, pipeline)?).await
    }

    /// Newest first, as returned by Concourse.
    pub async fn list_builds(
        &self,
        team: &str,
        pipeline: &str,
        job: &str,
        limit: u32,
    ) -> ConcourseResult<Vec<BuildDto>> {
        self.get_json(&paths::job_builds_with_limit_path(team, pipeline, job, limit)?)
            .await
    }
}
