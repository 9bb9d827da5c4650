//! Shared fixtures: a real gateway service over the in-memory Concourse
//! backend, wrapped in the production router.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use bytes::Bytes;
use cigate_axum::{ApiKey, ApiKeys, AxumContext, CorsConfig, create_router};
use cigate_concourse::testing::FakeBackend;
use cigate_concourse::{ConcourseClientConfig, ConcourseProvider, PROVIDER_KIND};
use cigate_core::{GatewayPort, GatewayService, Job, JobRegistry};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const API_KEY: &str = "test-key";

pub fn jobs() -> Vec<Job> {
    let reference = |pipeline: &str, job: &str| {
        json!({"team": "main", "pipeline": pipeline, "job": job})
            .as_object()
            .unwrap()
            .clone()
    };
    vec![
        Job::new("build-api", PROVIDER_KIND, reference("p", "j")),
        Job::new("deploy-site", PROVIDER_KIND, reference("site", "deploy")),
    ]
}

pub fn gateway(backend: FakeBackend) -> (Arc<dyn GatewayPort>, Arc<FakeBackend>) {
    let backend = Arc::new(backend.with_token("backend-token", 3600));
    let config = ConcourseClientConfig::new()
        .with_base_url("https://ci.example.com")
        .with_credentials("admin", "pw");
    let provider = ConcourseProvider::with_backend(&config, Arc::clone(&backend)).unwrap();
    let service = GatewayService::new(provider, JobRegistry::new(jobs()).unwrap());
    (Arc::new(service), backend)
}

pub fn app(backend: FakeBackend) -> (Router, Arc<FakeBackend>) {
    let (gateway, backend) = gateway(backend);
    (app_for(gateway), backend)
}

pub fn app_for(gateway: Arc<dyn GatewayPort>) -> Router {
    let keys = ApiKeys::new([ApiKey::new("ci-bot", API_KEY)]);
    create_router(AxumContext::new(gateway, keys), &CorsConfig::AllowAll)
}

pub fn get(uri: &str) -> Request<Body> {
    authorized(Request::get(uri)).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    authorized(Request::post(uri))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authorized(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder.header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    pub fn request_id(&self) -> &str {
        self.headers["x-request-id"].to_str().unwrap()
    }
}

pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        headers,
        body,
    }
}
