//! Port trait implementations for `ConcourseProvider`.
//!
//! This module implements the core-owned `CiProvider` and
//! `DiscoveryCapable` traits, handling the conversion between Concourse
//! wire types and core DTOs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cigate_core::{
    BuildDetails, BuildInfo, CiProvider, DiscoveryCapable, EventSink, PipelineInfo,
    PipelineJobInfo, ProviderError, ProviderRef, ProviderResult, Run, TeamInfo, TriggerParams,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::auth::{CredentialCache, PasswordGrantFetcher};
use crate::client::ConcourseClient;
use crate::config::{AuthMode, ConcourseClientConfig, ConfigError};
use crate::error::ConcourseError;
use crate::events;
use crate::http::{HttpBackend, ReqwestBackend};
use crate::mapper;
use crate::paths;
use crate::reference::{ConcourseJobRef, ConcourseRunRef};

/// Provider kind as written in job definitions.
pub const PROVIDER_KIND: &str = "concourse";

// ============================================================================
// Error Mapping
// ============================================================================

/// Convert internal `ConcourseError` to core `ProviderError`.
fn map_error(err: ConcourseError) -> ProviderError {
    match err {
        ConcourseError::ApiRequestFailed {
            status,
            path,
            message,
        } => match status {
            404 => ProviderError::NotFound { resource: path },
            401 | 403 => ProviderError::Unauthorized { message },
            502 | 503 => ProviderError::Unavailable { message },
            code => ProviderError::Api { code, message },
        },
        e @ ConcourseError::Unauthorized { .. } => ProviderError::Unauthorized {
            message: e.to_string(),
        },
        ConcourseError::TokenRejected { status, message } if status >= 500 => {
            ProviderError::Unavailable {
                message: format!("token endpoint returned {status}: {message}"),
            }
        }
        ConcourseError::TokenRejected { message, .. } => ProviderError::Unauthorized { message },
        ConcourseError::Network(e) => ProviderError::Unavailable {
            message: e.to_string(),
        },
        ConcourseError::Connection { message } => ProviderError::Unavailable { message },
        ConcourseError::InvalidResponse { message } => ProviderError::InvalidResponse { message },
        ConcourseError::InvalidUrl(e) => ProviderError::InvalidResponse {
            message: format!("could not build request URL: {e}"),
        },
        ConcourseError::JsonParse(e) => ProviderError::InvalidResponse {
            message: e.to_string(),
        },
        ConcourseError::MalformedReference { reference, reason } => {
            ProviderError::MalformedReference { reference, reason }
        }
        ConcourseError::InvalidJobRef { message } => ProviderError::InvalidJobRef { message },
        ConcourseError::InvalidName { name } => ProviderError::NotFound { resource: name },
        ConcourseError::Sink(e) => ProviderError::Sink(e),
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Default provider using the reqwest HTTP backend.
pub type DefaultConcourseProvider = ConcourseProvider<ReqwestBackend>;

/// Concourse implementation of the provider ports.
///
/// Generic over the HTTP backend so tests can substitute canned responses.
/// Production code uses [`DefaultConcourseProvider::new`].
pub struct ConcourseProvider<B: HttpBackend = ReqwestBackend> {
    client: ConcourseClient<B>,
}

impl DefaultConcourseProvider {
    /// Validate `config` and build a provider on top of reqwest.
    pub fn new(config: &ConcourseClientConfig) -> Result<Self, ConfigError> {
        let backend = Arc::new(ReqwestBackend::new(config)?);
        Self::assemble(config, backend)
    }
}

impl<B: HttpBackend + 'static> ConcourseProvider<B> {
    /// Create a provider with a custom backend.
    ///
    /// Use this for testing with a fake backend.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_backend(config: &ConcourseClientConfig, backend: Arc<B>) -> Result<Self, ConfigError> {
        Self::assemble(config, backend)
    }

    fn assemble(config: &ConcourseClientConfig, backend: Arc<B>) -> Result<Self, ConfigError> {
        let base_url = config.parsed_base_url()?;
        let team = config.validated_team()?;

        let credentials = match config.auth_mode()? {
            AuthMode::Static(token) => {
                info!("Using pre-supplied Concourse bearer token");
                CredentialCache::with_static_token(token)
            }
            AuthMode::Password { username, password } => {
                let token_url =
                    base_url
                        .join(paths::TOKEN_PATH)
                        .map_err(|e| ConfigError::InvalidUrl {
                            url: base_url.to_string(),
                            reason: e.to_string(),
                        })?;
                info!(username = %username, "Using Concourse password grant");
                let fetcher =
                    PasswordGrantFetcher::new(Arc::clone(&backend), token_url, username, password);
                CredentialCache::with_fetcher(Arc::new(fetcher), config.refresh_margin)
            }
        };

        Ok(Self {
            client: ConcourseClient::new(backend, Arc::new(credentials), base_url, team),
        })
    }

    fn team<'a>(&'a self, team: Option<&'a str>) -> &'a str {
        team.filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.client.default_team())
    }
}

// ============================================================================
// Port Implementation
// ============================================================================

#[async_trait]
impl<B: HttpBackend + 'static> CiProvider for ConcourseProvider<B> {
    type JobRef = ConcourseJobRef;
    type RunRef = ConcourseRunRef;

    fn kind(&self) -> &'static str {
        PROVIDER_KIND
    }

    fn job_ref(&self, reference: &ProviderRef) -> ProviderResult<ConcourseJobRef> {
        ConcourseJobRef::from_provider_ref(reference).map_err(map_error)
    }

    fn parse_run_ref(&self, run_id: &str) -> ProviderResult<ConcourseRunRef> {
        run_id.parse().map_err(map_error)
    }

    async fn trigger(
        &self,
        job: &ConcourseJobRef,
        params: &TriggerParams,
    ) -> ProviderResult<ConcourseRunRef> {
        let build = self
            .client
            .create_build(&job.team, &job.pipeline, &job.job, &params.parameters)
            .await
            .map_err(map_error)?;

        debug!(build_id = build.id, build_name = %build.name, "Concourse build created");
        Ok(ConcourseRunRef::new(job, build.id))
    }

    async fn get_run(&self, run: &ConcourseRunRef) -> ProviderResult<Run> {
        let build = self
            .client
            .get_build(run.build_id)
            .await
            .map_err(map_error)?;

        // A build id reused under another job's run id must not resolve.
        let mismatch = [
            (build.team_name.as_deref(), run.team.as_str()),
            (build.pipeline_name.as_deref(), run.pipeline.as_str()),
            (build.job_name.as_deref(), run.job.as_str()),
        ]
        .into_iter()
        .any(|(actual, expected)| actual.is_some_and(|a| a != expected));
        if mismatch {
            return Err(ProviderError::NotFound {
                resource: run.to_string(),
            });
        }

        Ok(mapper::to_run(run, &build, Utc::now()))
    }

    async fn stream_events(
        &self,
        run: &ConcourseRunRef,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> ProviderResult<()> {
        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            body = self.client.open_events(run.build_id) => body.map_err(map_error)?,
        };
        events::relay(body, sink, cancel).await.map_err(map_error)
    }

    async fn cancel(&self, run: &ConcourseRunRef) -> ProviderResult<()> {
        self.client
            .abort_build(run.build_id)
            .await
            .map_err(map_error)
    }

    async fn health_check(&self) -> ProviderResult<()> {
        self.client.info().await.map(|_| ()).map_err(map_error)
    }

    fn discovery(&self) -> Option<&dyn DiscoveryCapable> {
        Some(self)
    }
}

#[async_trait]
impl<B: HttpBackend + 'static> DiscoveryCapable for ConcourseProvider<B> {
    async fn list_teams(&self) -> ProviderResult<Vec<TeamInfo>> {
        let teams = self.client.list_teams().await.map_err(map_error)?;
        Ok(teams.into_iter().map(mapper::to_team_info).collect())
    }

    async fn list_pipelines(&self, team: Option<&str>) -> ProviderResult<Vec<PipelineInfo>> {
        let pipelines = self
            .client
            .list_pipelines(self.team(team))
            .await
            .map_err(map_error)?;
        Ok(pipelines.into_iter().map(mapper::to_pipeline_info).collect())
    }

    async fn list_jobs(
        &self,
        team: Option<&str>,
        pipeline: &str,
    ) -> ProviderResult<Vec<PipelineJobInfo>> {
        let jobs = self
            .client
            .list_jobs(self.team(team), pipeline)
            .await
            .map_err(map_error)?;
        Ok(jobs.into_iter().map(mapper::to_job_info).collect())
    }

    async fn list_builds(
        &self,
        team: Option<&str>,
        pipeline: &str,
        job: &str,
        limit: u32,
    ) -> ProviderResult<Vec<BuildInfo>> {
        let builds = self
            .client
            .list_builds(self.team(team), pipeline, job, limit)
            .await
            .map_err(map_error)?;
        Ok(builds.into_iter().map(mapper::to_build_info).collect())
    }

    async fn get_build_details(&self, build_id: u64) -> ProviderResult<BuildDetails> {
        let build = self.client.get_build(build_id).await.map_err(map_error)?;

        let plan = match self.client.get_build_plan(build_id).await {
            Ok(plan) => Some(plan),
            Err(e) => {
                debug!(build_id, error = %e, "Build plan unavailable");
                None
            }
        };

        Ok(BuildDetails {
            build: mapper::to_build_info(build),
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use cigate_core::{CoreError, GatewayPort, GatewayService, Job, JobRegistry, RunStatus};
    use reqwest::Method;
    use serde_json::json;

    fn config() -> ConcourseClientConfig {
        ConcourseClientConfig::new()
            .with_base_url("https://ci.example.com")
            .with_credentials("admin", "pw")
    }

    fn provider(backend: FakeBackend) -> (ConcourseProvider<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(backend.with_token("token", 3600));
        let provider = ConcourseProvider::with_backend(&config(), Arc::clone(&backend)).unwrap();
        (provider, backend)
    }

    fn registry() -> JobRegistry {
        let reference = json!({"team": "main", "pipeline": "p", "job": "j"});
        JobRegistry::new(vec![Job::new(
            "build-api",
            PROVIDER_KIND,
            reference.as_object().unwrap().clone(),
        )])
        .unwrap()
    }

    fn service(backend: FakeBackend) -> (GatewayService<ConcourseProvider<FakeBackend>>, Arc<FakeBackend>) {
        let (provider, backend) = provider(backend);
        (GatewayService::new(provider, registry()), backend)
    }

    fn run_ref() -> ConcourseRunRef {
        "main:p:j:42".parse().unwrap()
    }

    // ------------------------------------------------------------------------
    // Error mapping
    // ------------------------------------------------------------------------

    fn api(status: u16) -> ConcourseError {
        ConcourseError::ApiRequestFailed {
            status,
            path: "api/v1/builds/42".to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_map_error_by_status() {
        assert!(matches!(map_error(api(404)), ProviderError::NotFound { .. }));
        assert!(matches!(map_error(api(401)), ProviderError::Unauthorized { .. }));
        assert!(matches!(map_error(api(403)), ProviderError::Unauthorized { .. }));
        assert!(matches!(map_error(api(502)), ProviderError::Unavailable { .. }));
        assert!(matches!(map_error(api(503)), ProviderError::Unavailable { .. }));
        assert!(matches!(
            map_error(api(409)),
            ProviderError::Api { code: 409, ref message } if message == "boom"
        ));
        assert!(matches!(map_error(api(500)), ProviderError::Api { code: 500, .. }));
    }

    #[test]
    fn test_map_error_token_failures() {
        let rejected = ConcourseError::TokenRejected {
            status: 401,
            message: "invalid".to_string(),
        };
        assert!(matches!(map_error(rejected), ProviderError::Unauthorized { .. }));

        let down = ConcourseError::TokenRejected {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert!(matches!(map_error(down), ProviderError::Unavailable { .. }));

        let transport = ConcourseError::Connection {
            message: "refused".to_string(),
        };
        assert!(matches!(map_error(transport), ProviderError::Unavailable { .. }));
    }

    #[test]
    fn test_construction_validates_config() {
        let backend = Arc::new(FakeBackend::new());
        let err = ConcourseProvider::with_backend(&ConcourseClientConfig::new(), Arc::clone(&backend))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingCredentials));

        let err = ConcourseProvider::with_backend(&config().with_base_url("::"), backend)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    // ------------------------------------------------------------------------
    // End-to-end through the gateway service
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_trigger_returns_queued_run() {
        let (service, backend) = service(
            FakeBackend::new()
                .with_response(
                    Method::POST,
                    "/api/v1/teams/main/pipelines/p/jobs/j/builds",
                    CannedResponse::json(201, &json!({"id": 42, "name": "1", "status": "pending"})),
                )
                .with_response(
                    Method::GET,
                    "/api/v1/builds/42",
                    CannedResponse::json(
                        200,
                        &json!({"id": 42, "status": "pending", "create_time": 1000,
                                "team_name": "main", "pipeline_name": "p", "job_name": "j"}),
                    ),
                ),
        );

        let run = service
            .trigger_run("build-api", TriggerParams::default())
            .await
            .unwrap();

        assert_eq!(run.run_id, "main:p:j:42");
        assert_eq!(run.status, RunStatus::Queued);
        assert_eq!(run.job_id.as_deref(), Some("build-api"));

        let posts = backend.requests_to("/jobs/j/builds");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].body, crate::http::RequestBody::Empty);
        assert_eq!(posts[0].bearer(), Some("token"));
    }

    #[tokio::test]
    async fn test_get_run_maps_running_build() {
        let (service, _) = service(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/builds/42",
            CannedResponse::json(
                200,
                &json!({"id": 42, "status": "started", "start_time": 1000, "end_time": 0}),
            ),
        ));

        let run = service.get_run("main:p:j:42").await.unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.started_at.map(|t| t.timestamp()), Some(1000));
        assert!(run.finished_at.is_none());
    }

    #[tokio::test]
    async fn test_malformed_run_id_is_run_not_found() {
        let (service, backend) = service(FakeBackend::new());

        let err = service.get_run("bad-id").await.unwrap_err();
        assert!(matches!(err, CoreError::RunNotFound(ref id) if id == "bad-id"));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_build_details_survive_plan_failure() {
        let (provider, _) = provider(
            FakeBackend::new()
                .with_response(
                    Method::GET,
                    "/api/v1/builds/42",
                    CannedResponse::json(200, &json!({"id": 42, "name": "7", "status": "failed"})),
                )
                .with_response(
                    Method::GET,
                    "/api/v1/builds/42/plan",
                    CannedResponse::text(500, "plan exploded"),
                ),
        );

        let details = provider.get_build_details(42).await.unwrap();
        assert_eq!(details.build.id, 42);
        assert_eq!(details.build.status, "failed");
        assert!(details.plan.is_none());
    }

    #[tokio::test]
    async fn test_build_details_include_plan() {
        let (provider, _) = provider(
            FakeBackend::new()
                .with_response(
                    Method::GET,
                    "/api/v1/builds/42",
                    CannedResponse::json(200, &json!({"id": 42, "status": "succeeded"})),
                )
                .with_response(
                    Method::GET,
                    "/api/v1/builds/42/plan",
                    CannedResponse::json(200, &json!({"plan": {"id": "a1"}})),
                ),
        );

        let details = provider.get_build_details(42).await.unwrap();
        assert_eq!(details.plan, Some(json!({"plan": {"id": "a1"}})));
    }

    // ------------------------------------------------------------------------
    // Provider operations
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_run_rejects_build_of_another_job() {
        let (provider, _) = provider(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/builds/42",
            CannedResponse::json(
                200,
                &json!({"id": 42, "status": "started", "team_name": "main",
                        "pipeline_name": "other", "job_name": "j"}),
            ),
        ));

        let err = provider.get_run(&run_ref()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_build_is_not_found() {
        let (provider, _) = provider(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/builds/42",
            CannedResponse::text(404, "not found"),
        ));

        assert!(matches!(
            provider.get_run(&run_ref()).await,
            Err(ProviderError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_trigger_sends_parameters() {
        let (provider, backend) = provider(FakeBackend::new().with_response(
            Method::POST,
            "/jobs/j/builds",
            CannedResponse::json(200, &json!({"id": 7})),
        ));
        let params = TriggerParams {
            parameters: json!({"version": "1.2.3"}).as_object().unwrap().clone(),
            idempotency_key: Some("abc".to_string()),
        };
        let job = provider
            .job_ref(json!({"team": "main", "pipeline": "p", "job": "j"}).as_object().unwrap())
            .unwrap();

        let run = provider.trigger(&job, &params).await.unwrap();
        assert_eq!(run.to_string(), "main:p:j:7");
        assert_eq!(
            backend.requests_to("/jobs/j/builds")[0].json_body(),
            Some(json!({"version": "1.2.3"}))
        );
    }

    #[tokio::test]
    async fn test_trigger_of_unknown_job_is_not_found() {
        let (provider, _) = provider(FakeBackend::new());
        let job = provider
            .job_ref(json!({"team": "main", "pipeline": "p", "job": "nope"}).as_object().unwrap())
            .unwrap();

        let err = provider.trigger(&job, &TriggerParams::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_aborts_build() {
        let (provider, backend) = provider(FakeBackend::new().with_response(
            Method::PUT,
            "/api/v1/builds/42/abort",
            CannedResponse::empty(204),
        ));

        provider.cancel(&run_ref()).await.unwrap();
        assert_eq!(backend.requests_to("/api/v1/builds/42/abort").len(), 1);
    }

    #[tokio::test]
    async fn test_stream_events_relays_frames() {
        let (provider, backend) = provider(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/builds/42/events",
            CannedResponse::stream(&[
                "id: 0\nevent: event\ndata: {\"event\":\"log\",\"data\":{\"payload\":\"hi\"}}\n\n",
                "event: end\ndata:\n\n",
            ]),
        ));

        let mut sink = Vec::new();
        provider
            .stream_events(&run_ref(), &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "data: {\"event\":\"log\",\"data\":{\"payload\":\"hi\"}}\n\n"
        );
        assert!(backend.requests_to("/events")[0].streaming);
    }

    #[tokio::test]
    async fn test_stream_events_of_missing_build() {
        let (provider, _) = provider(FakeBackend::new());
        let mut sink = Vec::new();

        let err = provider
            .stream_events(&run_ref(), &mut sink, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_health_check_uses_info_endpoint() {
        let (provider, backend) = provider(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/info",
            CannedResponse::json(200, &json!({"version": "7.11.0"})),
        ));

        provider.health_check().await.unwrap();
        assert_eq!(backend.requests_to("/api/v1/info").len(), 1);
    }

    #[tokio::test]
    async fn test_discovery_defaults_to_configured_team() {
        let (provider, backend) = provider(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/teams/main/pipelines",
            CannedResponse::json(200, &json!([{"id": 1, "name": "p", "team_name": "main"}])),
        ));

        let pipelines = provider.list_pipelines(None).await.unwrap();
        assert_eq!(pipelines[0].name, "p");
        assert_eq!(pipelines[0].team, "main");
        assert_eq!(backend.requests_to("/api/v1/teams/main/pipelines").len(), 1);
    }

    #[tokio::test]
    async fn test_list_jobs_maps_nested_builds() {
        let (provider, _) = provider(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/teams/ops/pipelines/p/jobs",
            CannedResponse::json(
                200,
                &json!([{
                    "id": 3, "name": "unit", "pipeline_name": "p", "team_name": "ops",
                    "finished_build": {"id": 9, "name": "4", "status": "succeeded", "end_time": 10}
                }]),
            ),
        ));

        let jobs = provider.list_jobs(Some("ops"), "p").await.unwrap();
        let finished = jobs[0].finished_build.as_ref().unwrap();
        assert_eq!(finished.status, "succeeded");
        assert!(jobs[0].next_build.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_after_retry_surfaces_through_service() {
        let (service, backend) = service(FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/builds/42",
            CannedResponse::empty(401),
        ));

        let err = service.get_run("main:p:j:42").await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
        assert_eq!(backend.requests_to("/api/v1/builds/42").len(), 2);
    }

    #[tokio::test]
    async fn test_dot_segment_names_never_reach_the_backend() {
        let (provider, backend) = provider(FakeBackend::new());

        for name in [".", ".."] {
            assert!(matches!(
                provider.list_jobs(None, name).await,
                Err(ProviderError::NotFound { .. })
            ));
            assert!(provider.list_pipelines(Some(name)).await.is_err());
            assert!(provider.list_builds(None, "p", name, 5).await.is_err());
        }
        assert!(backend.requests().is_empty());

        let (service, backend) = service(FakeBackend::new());
        let err = service.list_pipeline_jobs(None, "..").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(backend.requests().is_empty());
    }
}
