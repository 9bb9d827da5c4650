//! Server-Sent Events relay through the HTTP layer.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use cigate_concourse::testing::{CannedResponse, FakeBackend, Method};
use cigate_core::{
    BuildDetails, BuildInfo, CoreError, EventSink, GatewayPort, HealthReport, Job, PipelineInfo,
    PipelineJobInfo, Run, TeamInfo, TriggerParams,
};
use http_body_util::BodyExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use common::{app, app_for, authorized, get, send};

fn events_request(request_id: &str) -> Request<Body> {
    authorized(Request::get("/v1/runs/main:p:j:42/events"))
        .header("x-request-id", request_id)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn stream_starts_with_connected_frame_and_relays_events() {
    let (app, backend) = app(FakeBackend::new().with_response(
        Method::GET,
        "/api/v1/builds/42/events",
        CannedResponse::stream(&[
            "id: 0\nevent: event\ndata: {\"event\":\"log\",\"data\":{\"payload\":\"hi\"}}\n\n",
            "id: 1\nevent: event\ndata: {\"event\":\"status\",\"data\":{\"status\":\"succeeded\"}}\n\n",
            "event: end\ndata:\n\n",
        ]),
    ));

    let response = send(app, events_request("req-sse")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers["x-accel-buffering"], "no");
    assert_eq!(
        response.text(),
        concat!(
            "event: connected\ndata: {\"request_id\":\"req-sse\"}\n\n",
            "data: {\"event\":\"log\",\"data\":{\"payload\":\"hi\"}}\n\n",
            "data: {\"event\":\"status\",\"data\":{\"status\":\"succeeded\"}}\n\n",
        )
    );
    assert!(backend.requests_to("/events")[0].streaming);
}

#[tokio::test]
async fn backend_failure_ends_stream_with_error_frame() {
    let (app, _) = app(FakeBackend::new().with_response(
        Method::GET,
        "/api/v1/builds/42/events",
        CannedResponse::text(500, "boom"),
    ));

    let response = send(app, events_request("req-err")).await;

    assert_eq!(response.status, StatusCode::OK);
    let text = response.text();
    assert!(text.starts_with("event: connected\n"));
    assert!(text.ends_with(
        "event: error\ndata: {\"message\":\"stream error\",\"request_id\":\"req-err\"}\n\n"
    ));
}

#[tokio::test]
async fn malformed_run_id_is_plain_404() {
    let (app, backend) = app(FakeBackend::new());

    let response = send(app, get("/v1/runs/bad-id/events")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.headers[header::CONTENT_TYPE], "application/json");
    assert!(backend.requests().is_empty());
}

/// Gateway whose event stream only ends when cancelled.
struct EndlessEvents {
    cancelled: Mutex<Option<oneshot::Sender<()>>>,
}

#[async_trait]
impl GatewayPort for EndlessEvents {
    fn list_jobs(&self) -> Vec<Job> {
        Vec::new()
    }

    async fn trigger_run(&self, job_id: &str, _: TriggerParams) -> Result<Run, CoreError> {
        Err(CoreError::JobNotFound(job_id.to_string()))
    }

    async fn get_run(&self, run_id: &str) -> Result<Run, CoreError> {
        Err(CoreError::RunNotFound(run_id.to_string()))
    }

    fn check_run_id(&self, _: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn stream_run_events(
        &self,
        _: &str,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        sink.write_frame(b"data: {\"n\":1}\n\n")
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        cancel.cancelled().await;
        if let Some(tx) = self.cancelled.lock().unwrap().take() {
            let _ = tx.send(());
        }
        Ok(())
    }

    async fn cancel_run(&self, _: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn list_teams(&self) -> Result<Vec<TeamInfo>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_pipelines(&self, _: Option<&str>) -> Result<Vec<PipelineInfo>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_pipeline_jobs(
        &self,
        _: Option<&str>,
        _: &str,
    ) -> Result<Vec<PipelineJobInfo>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_job_builds(
        &self,
        _: Option<&str>,
        _: &str,
        _: &str,
        _: u32,
    ) -> Result<Vec<BuildInfo>, CoreError> {
        Ok(Vec::new())
    }

    async fn get_build_details(&self, build_id: u64) -> Result<BuildDetails, CoreError> {
        Err(CoreError::NotFound(build_id.to_string()))
    }

    async fn health(&self) -> HealthReport {
        unimplemented!("not used by event tests")
    }
}

#[tokio::test]
async fn dropping_the_body_cancels_the_relay() {
    let (tx, rx) = oneshot::channel();
    let app = app_for(Arc::new(EndlessEvents {
        cancelled: Mutex::new(Some(tx)),
    }));

    let response = app.oneshot(events_request("req-drop")).await.unwrap();
    let mut body = response.into_body();

    let connected = body.frame().await.unwrap().unwrap().into_data().unwrap();
    assert!(connected.starts_with(b"event: connected"));
    let first = body.frame().await.unwrap().unwrap().into_data().unwrap();
    assert_eq!(&first[..], b"data: {\"n\":1}\n\n");

    drop(body);
    tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("relay was not cancelled")
        .unwrap();
}
