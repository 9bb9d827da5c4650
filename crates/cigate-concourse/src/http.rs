//! HTTP backend abstraction for the Concourse API.
//!
//! This module provides a trait-based HTTP backend that allows for
//! dependency injection and easy testing. Every response body is exposed as
//! a byte stream so the event relay can consume it incrementally; buffered
//! callers use [`BackendResponse::into_bytes`].

use std::io;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::config::{ConcourseClientConfig, ConfigError};
use crate::error::{ConcourseError, ConcourseResult};

/// Response body as a stream of chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Credentials attached to an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

/// Outgoing request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// Serialized JSON, sent with `Content-Type: application/json`.
    Json(Bytes),
    /// `application/x-www-form-urlencoded` fields.
    Form(Vec<(String, String)>),
}

/// A single outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    pub url: Url,
    pub auth: Auth,
    pub body: RequestBody,
    /// Long-lived response; exempt from the request timeout.
    pub streaming: bool,
}

impl BackendRequest {
    pub const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            auth: Auth::None,
            body: RequestBody::Empty,
            streaming: false,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub const fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }
}

/// Status plus streaming body.
pub struct BackendResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl BackendResponse {
    /// Response with a fully buffered body.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            body: Box::pin(futures_util::stream::once(async move { Ok(body) })),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Drain the body into memory.
    pub async fn into_bytes(mut self) -> ConcourseResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            let chunk = chunk.map_err(|e| ConcourseError::Connection {
                message: format!("failed to read response body: {e}"),
            })?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

impl std::fmt::Debug for BackendResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that can execute a request.
///
/// This abstraction allows for dependency injection of HTTP clients,
/// making it easy to test code that depends on HTTP requests. Non-success
/// statuses are returned as responses, not errors; only transport failures
/// are errors.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: BackendRequest) -> ConcourseResult<BackendResponse>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
///
/// No transport retries: a failed connection is reported to the caller.
pub struct ReqwestBackend {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &ConcourseClientConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: BackendRequest) -> ConcourseResult<BackendResponse> {
        let mut builder = self.client.request(request.method, request.url);

        if request.streaming {
            builder = builder.header(ACCEPT, "text/event-stream");
        } else {
            builder = builder.timeout(self.timeout);
        }

        builder = match request.auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        };

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.header(CONTENT_TYPE, "application/json").body(bytes),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other));

        Ok(BackendResponse {
            status,
            body: Box::pin(body),
        })
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Canned response for the fake backend.
    #[derive(Clone, Debug)]
    pub struct CannedResponse {
        pub status: u16,
        pub chunks: Vec<Bytes>,
        /// Keep the body open after the last chunk, like a build that is
        /// still running.
        pub hang: bool,
        /// Fail the request at the transport level instead of answering.
        pub connection_error: bool,
    }

    impl CannedResponse {
        pub fn json(status: u16, value: &serde_json::Value) -> Self {
            Self::text(status, value.to_string())
        }

        pub fn text(status: u16, body: impl Into<String>) -> Self {
            Self {
                status,
                chunks: vec![Bytes::from(body.into())],
                hang: false,
                connection_error: false,
            }
        }

        pub const fn empty(status: u16) -> Self {
            Self {
                status,
                chunks: Vec::new(),
                hang: false,
                connection_error: false,
            }
        }

        /// A 200 response whose body arrives in the given chunks.
        pub fn stream<S: AsRef<[u8]>>(chunks: &[S]) -> Self {
            Self {
                status: 200,
                chunks: chunks
                    .iter()
                    .map(|c| Bytes::copy_from_slice(c.as_ref()))
                    .collect(),
                hang: false,
                connection_error: false,
            }
        }

        #[must_use]
        pub const fn hanging(mut self) -> Self {
            self.hang = true;
            self
        }

        pub const fn unreachable() -> Self {
            Self {
                status: 0,
                chunks: Vec::new(),
                hang: false,
                connection_error: true,
            }
        }

        pub fn into_response(self) -> ConcourseResult<BackendResponse> {
            if self.connection_error {
                return Err(ConcourseError::Connection {
                    message: "connection refused".to_string(),
                });
            }
            let chunks = futures_util::stream::iter(self.chunks.into_iter().map(Ok));
            let body: ByteStream = if self.hang {
                Box::pin(chunks.chain(futures_util::stream::pending()))
            } else {
                Box::pin(chunks)
            };
            Ok(BackendResponse {
                status: self.status,
                body,
            })
        }
    }

    /// A request observed by the fake backend.
    #[derive(Clone, Debug)]
    pub struct RecordedRequest {
        pub method: Method,
        pub url: Url,
        pub auth: Auth,
        pub body: RequestBody,
        pub streaming: bool,
    }

    impl RecordedRequest {
        pub fn bearer(&self) -> Option<&str> {
            match &self.auth {
                Auth::Bearer(token) => Some(token),
                _ => None,
            }
        }

        pub fn json_body(&self) -> Option<serde_json::Value> {
            match &self.body {
                RequestBody::Json(bytes) => serde_json::from_slice(bytes).ok(),
                _ => None,
            }
        }
    }

    struct Route {
        method: Method,
        path_suffix: String,
        responses: VecDeque<CannedResponse>,
    }

    /// A fake HTTP backend that returns canned responses.
    ///
    /// Routes match on method plus a suffix of `path?query`. Responses
    /// registered for the same route are served in order; the last one
    /// repeats.
    #[derive(Default)]
    pub struct FakeBackend {
        routes: Mutex<Vec<Route>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl FakeBackend {
        /// Create a new fake backend.
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a canned response for a route.
        #[must_use]
        pub fn with_response(self, method: Method, path_suffix: &str, response: CannedResponse) -> Self {
            {
                let mut routes = self.routes.lock().unwrap();
                if let Some(route) = routes
                    .iter_mut()
                    .find(|r| r.method == method && r.path_suffix == path_suffix)
                {
                    route.responses.push_back(response);
                } else {
                    routes.push(Route {
                        method,
                        path_suffix: path_suffix.to_string(),
                        responses: VecDeque::from([response]),
                    });
                }
            }
            self
        }

        /// Answer the password grant with `token`, valid for `expires_in` seconds.
        #[must_use]
        pub fn with_token(self, token: &str, expires_in: u64) -> Self {
            self.with_response(
                Method::POST,
                "/sky/issuer/token",
                CannedResponse::json(
                    200,
                    &serde_json::json!({
                        "access_token": token,
                        "token_type": "bearer",
                        "expires_in": expires_in,
                    }),
                ),
            )
        }

        /// All requests observed so far.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// Requests whose path ends with `path_suffix`.
        pub fn requests_to(&self, path_suffix: &str) -> Vec<RecordedRequest> {
            self.requests()
                .into_iter()
                .filter(|r| path_and_query(&r.url).ends_with(path_suffix))
                .collect()
        }

        fn next_response(&self, method: &Method, url: &Url) -> Option<CannedResponse> {
            let target = path_and_query(url);
            let mut routes = self.routes.lock().unwrap();
            let route = routes
                .iter_mut()
                .find(|r| &r.method == method && target.ends_with(&r.path_suffix))?;
            if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            }
        }
    }

    fn path_and_query(url: &Url) -> String {
        match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn send(&self, request: BackendRequest) -> ConcourseResult<BackendResponse> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method: request.method.clone(),
                url: request.url.clone(),
                auth: request.auth.clone(),
                body: request.body.clone(),
                streaming: request.streaming,
            });

            match self.next_response(&request.method, &request.url) {
                Some(response) => response.into_response(),
                None => Ok(BackendResponse::from_bytes(
                    404,
                    r#"{"error":"no canned response"}"#,
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    fn url(path: &str) -> Url {
        Url::parse("https://ci.example.com/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_reqwest_backend_creation() {
        let config = ConcourseClientConfig::new().with_timeout(Duration::from_secs(7));
        let backend = ReqwestBackend::new(&config).unwrap();
        assert_eq!(backend.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_request_builder() {
        let request = BackendRequest::new(Method::GET, url("api/v1/builds/1/events"))
            .with_auth(Auth::Bearer("t".to_string()))
            .streaming();
        assert!(request.streaming);
        assert_eq!(request.auth, Auth::Bearer("t".to_string()));
        assert_eq!(request.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn test_into_bytes_joins_chunks() {
        let response = CannedResponse::stream(&["ab", "cd", "ef"])
            .into_response()
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.into_bytes().await.unwrap(), Bytes::from("abcdef"));
    }

    #[tokio::test]
    async fn test_fake_backend_returns_canned_response() {
        let backend = FakeBackend::new().with_response(
            Method::GET,
            "/api/v1/builds/42",
            CannedResponse::json(200, &json!({"id": 42})),
        );

        let response = backend
            .send(BackendRequest::new(Method::GET, url("api/v1/builds/42")))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        let body = response.into_bytes().await.unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&body).unwrap()["id"], 42);
    }

    #[tokio::test]
    async fn test_fake_backend_distinguishes_suffixes() {
        let backend = FakeBackend::new()
            .with_response(Method::GET, "/builds/42", CannedResponse::empty(200))
            .with_response(Method::GET, "/builds/42/plan", CannedResponse::empty(500));

        let plan = backend
            .send(BackendRequest::new(Method::GET, url("api/v1/builds/42/plan")))
            .await
            .unwrap();
        assert_eq!(plan.status, 500);
    }

    #[tokio::test]
    async fn test_fake_backend_serves_sequence_then_repeats_last() {
        let backend = FakeBackend::new()
            .with_response(Method::GET, "/info", CannedResponse::empty(401))
            .with_response(Method::GET, "/info", CannedResponse::empty(200));

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = backend
                .send(BackendRequest::new(Method::GET, url("api/v1/info")))
                .await
                .unwrap();
            statuses.push(response.status);
        }
        assert_eq!(statuses, [401, 200, 200]);
        assert_eq!(backend.requests_to("/info").len(), 3);
    }

    #[tokio::test]
    async fn test_fake_backend_returns_404_for_unknown_route() {
        let backend = FakeBackend::new();
        let response = backend
            .send(BackendRequest::new(Method::GET, url("unknown")))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_fake_backend_connection_error() {
        let backend = FakeBackend::new().with_response(
            Method::GET,
            "/info",
            CannedResponse::unreachable(),
        );
        let result = backend
            .send(BackendRequest::new(Method::GET, url("api/v1/info")))
            .await;
        assert!(matches!(result, Err(ConcourseError::Connection { .. })));
    }
}
