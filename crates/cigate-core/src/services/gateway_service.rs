//! Gateway service - the provider-agnostic run surface.
//!
//! Resolves public job ids through the [`JobRegistry`], parses public run ids
//! through the provider's codec, delegates to the provider, and performs the
//! single translation step from provider errors to [`CoreError`].

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    BuildDetails, BuildInfo, ComponentHealth, HealthChecks, HealthReport, HealthStatus, Job,
    PipelineInfo, PipelineJobInfo, Run, TeamInfo, TriggerParams,
};
use crate::ports::{
    CiProvider, CoreError, DiscoveryCapable, EventSink, GatewayPort, ProviderError,
};
use crate::registry::JobRegistry;

/// Service name reported in health responses.
pub const SERVICE_NAME: &str = "cigate";

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway service over a single CI provider.
pub struct GatewayService<P> {
    provider: P,
    registry: JobRegistry,
    health_timeout: Duration,
}

impl<P: CiProvider> GatewayService<P> {
    pub const fn new(provider: P, registry: JobRegistry) -> Self {
        Self {
            provider,
            registry,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// Bound the provider probe in [`GatewayPort::health`].
    ///
    /// Defaults to 5 seconds.
    #[must_use]
    pub const fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    fn parse_run(&self, run_id: &str) -> Result<P::RunRef, CoreError> {
        self.provider.parse_run_ref(run_id).map_err(|e| {
            debug!(run_id, error = %e, "Rejected malformed run id");
            CoreError::RunNotFound(run_id.to_string())
        })
    }

    fn discovery(&self, operation: &str) -> Result<&dyn DiscoveryCapable, CoreError> {
        self.provider.discovery().ok_or_else(|| {
            CoreError::Unsupported(format!(
                "provider '{}' does not support {operation}",
                self.provider.kind()
            ))
        })
    }
}

/// Run-scoped translation: a missing build is a missing run.
fn run_error(run_id: &str, err: ProviderError) -> CoreError {
    match err {
        ProviderError::NotFound { .. } | ProviderError::MalformedReference { .. } => {
            CoreError::RunNotFound(run_id.to_string())
        }
        other => other.into(),
    }
}

#[async_trait]
impl<P> GatewayPort for GatewayService<P>
where
    P: CiProvider,
{
    fn list_jobs(&self) -> Vec<Job> {
        self.registry.iter().cloned().collect()
    }

    async fn trigger_run(&self, job_id: &str, params: TriggerParams) -> Result<Run, CoreError> {
        let job = self
            .registry
            .get(job_id)
            .ok_or_else(|| CoreError::JobNotFound(job_id.to_string()))?;

        if job.provider.kind != self.provider.kind() {
            return Err(CoreError::Configuration(format!(
                "job '{job_id}' uses unsupported provider kind '{}'",
                job.provider.kind
            )));
        }

        let job_ref = self
            .provider
            .job_ref(&job.provider.reference)
            .map_err(|e| CoreError::Configuration(format!("job '{job_id}': {e}")))?;

        debug!(
            job_id,
            ?job_ref,
            idempotency_key = params.idempotency_key.as_deref(),
            param_count = params.parameters.len(),
            "Triggering run"
        );

        let run_ref = self
            .provider
            .trigger(&job_ref, &params)
            .await
            .map_err(|e| {
                warn!(job_id, error = %e, "Trigger failed");
                match e {
                    ProviderError::NotFound { .. } => CoreError::JobNotFound(job_id.to_string()),
                    other => other.into(),
                }
            })?;

        let run_id = run_ref.to_string();
        let mut run = self
            .provider
            .get_run(&run_ref)
            .await
            .map_err(|e| run_error(&run_id, e))?;
        run.job_id = Some(job_id.to_string());

        info!(job_id, run_id = %run.run_id, status = %run.status, "Run triggered");
        Ok(run)
    }

    async fn get_run(&self, run_id: &str) -> Result<Run, CoreError> {
        let run_ref = self.parse_run(run_id)?;
        self.provider
            .get_run(&run_ref)
            .await
            .map_err(|e| run_error(run_id, e))
    }

    fn check_run_id(&self, run_id: &str) -> Result<(), CoreError> {
        self.parse_run(run_id).map(|_| ())
    }

    async fn stream_run_events(
        &self,
        run_id: &str,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let run_ref = self.parse_run(run_id)?;
        info!(run_id, "Starting event stream");

        let result = self
            .provider
            .stream_events(&run_ref, sink, cancel)
            .await
            .map_err(|e| run_error(run_id, e));

        match &result {
            Ok(()) if cancel.is_cancelled() => info!(run_id, "Event stream canceled by caller"),
            Ok(()) => info!(run_id, "Event stream completed"),
            Err(e) => warn!(run_id, error = %e, "Event stream failed"),
        }
        result
    }

    async fn cancel_run(&self, run_id: &str) -> Result<(), CoreError> {
        let run_ref = self.parse_run(run_id)?;
        self.provider
            .cancel(&run_ref)
            .await
            .map_err(|e| run_error(run_id, e))?;
        info!(run_id, "Run canceled");
        Ok(())
    }

    async fn list_teams(&self) -> Result<Vec<TeamInfo>, CoreError> {
        let teams = self.discovery("team listing")?.list_teams().await?;
        debug!(count = teams.len(), "Teams listed");
        Ok(teams)
    }

    async fn list_pipelines(&self, team: Option<&str>) -> Result<Vec<PipelineInfo>, CoreError> {
        let pipelines = self
            .discovery("pipeline listing")?
            .list_pipelines(team)
            .await?;
        debug!(team, count = pipelines.len(), "Pipelines listed");
        Ok(pipelines)
    }

    async fn list_pipeline_jobs(
        &self,
        team: Option<&str>,
        pipeline: &str,
    ) -> Result<Vec<PipelineJobInfo>, CoreError> {
        let jobs = self
            .discovery("job listing")?
            .list_jobs(team, pipeline)
            .await?;
        debug!(team, pipeline, count = jobs.len(), "Pipeline jobs listed");
        Ok(jobs)
    }

    async fn list_job_builds(
        &self,
        team: Option<&str>,
        pipeline: &str,
        job: &str,
        limit: u32,
    ) -> Result<Vec<BuildInfo>, CoreError> {
        let builds = self
            .discovery("build listing")?
            .list_builds(team, pipeline, job, limit)
            .await?;
        debug!(team, pipeline, job, limit, count = builds.len(), "Job builds listed");
        Ok(builds)
    }

    async fn get_build_details(&self, build_id: u64) -> Result<BuildDetails, CoreError> {
        let details = self
            .discovery("build details")?
            .get_build_details(build_id)
            .await?;
        debug!(
            build_id,
            status = %details.build.status,
            has_plan = details.plan.is_some(),
            "Build details retrieved"
        );
        Ok(details)
    }

    async fn health(&self) -> HealthReport {
        let job_config = ComponentHealth {
            count: Some(self.registry.len()),
            ..ComponentHealth::healthy()
        };

        let probe = tokio::time::timeout(self.health_timeout, self.provider.health_check()).await;
        let (status, provider) = match probe {
            Ok(Ok(())) => (
                HealthStatus::Healthy,
                ComponentHealth {
                    provider: Some(self.provider.kind().to_string()),
                    ..ComponentHealth::healthy()
                },
            ),
            Ok(Err(e)) => {
                warn!(error = %e, "Provider health check failed");
                (HealthStatus::Degraded, ComponentHealth::unhealthy(e.to_string()))
            }
            Err(_) => {
                warn!(timeout = ?self.health_timeout, "Provider health check timed out");
                (
                    HealthStatus::Degraded,
                    ComponentHealth::unhealthy(format!(
                        "health check timed out after {:?}",
                        self.health_timeout
                    )),
                )
            }
        };

        debug!(?status, "Health check completed");
        HealthReport {
            status,
            service: SERVICE_NAME.to_string(),
            checks: HealthChecks {
                job_config,
                provider,
            },
        }
    }
}
