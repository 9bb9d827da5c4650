//! Optional discovery capability.

use async_trait::async_trait;

use super::error::ProviderResult;
use crate::domain::{BuildDetails, BuildInfo, PipelineInfo, PipelineJobInfo, TeamInfo};

/// Read-only browsing of the backend's teams, pipelines, jobs and builds.
///
/// A `team` of `None` means the provider's configured default team.
#[async_trait]
pub trait DiscoveryCapable: Send + Sync {
    async fn list_teams(&self) -> ProviderResult<Vec<TeamInfo>>;

    async fn list_pipelines(&self, team: Option<&str>) -> ProviderResult<Vec<PipelineInfo>>;

    async fn list_jobs(
        &self,
        team: Option<&str>,
        pipeline: &str,
    ) -> ProviderResult<Vec<PipelineJobInfo>>;

    /// Most recent builds of a job, newest first, at most `limit`.
    async fn list_builds(
        &self,
        team: Option<&str>,
        pipeline: &str,
        job: &str,
        limit: u32,
    ) -> ProviderResult<Vec<BuildInfo>>;

    /// A build plus its plan; a failed plan lookup leaves `plan` empty.
    async fn get_build_details(&self, build_id: u64) -> ProviderResult<BuildDetails>;
}
