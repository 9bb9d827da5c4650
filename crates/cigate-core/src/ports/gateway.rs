//! Front-end facing gateway port.
//!
//! The HTTP and CLI adapters only see this object-safe trait, so they stay
//! independent of which provider the service was built with.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{CoreError, EventSink};
use crate::domain::{
    BuildDetails, BuildInfo, HealthReport, Job, PipelineInfo, PipelineJobInfo, Run, TeamInfo,
    TriggerParams,
};

#[async_trait]
pub trait GatewayPort: Send + Sync {
    /// All configured jobs, ordered by `job_id`.
    fn list_jobs(&self) -> Vec<Job>;

    /// Trigger a run and return its first observed state.
    async fn trigger_run(&self, job_id: &str, params: TriggerParams) -> Result<Run, CoreError>;

    async fn get_run(&self, run_id: &str) -> Result<Run, CoreError>;

    /// Validate a run id without contacting the backend.
    fn check_run_id(&self, run_id: &str) -> Result<(), CoreError>;

    async fn stream_run_events(
        &self,
        run_id: &str,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError>;

    async fn cancel_run(&self, run_id: &str) -> Result<(), CoreError>;

    async fn list_teams(&self) -> Result<Vec<TeamInfo>, CoreError>;

    async fn list_pipelines(&self, team: Option<&str>) -> Result<Vec<PipelineInfo>, CoreError>;

    async fn list_pipeline_jobs(
        &self,
        team: Option<&str>,
        pipeline: &str,
    ) -> Result<Vec<PipelineJobInfo>, CoreError>;

    async fn list_job_builds(
        &self,
        team: Option<&str>,
        pipeline: &str,
        job: &str,
        limit: u32,
    ) -> Result<Vec<BuildInfo>, CoreError>;

    async fn get_build_details(&self, build_id: u64) -> Result<BuildDetails, CoreError>;

    async fn health(&self) -> HealthReport;
}
