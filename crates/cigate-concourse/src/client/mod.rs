//! Authenticated Concourse API client.
//!
//! Every request carries the cached bearer token. A 401 invalidates the
//! token and the request is repeated exactly once with a fresh one; a second
//! 401 is reported as [`ConcourseError::Unauthorized`].

mod builds;
mod discovery;

use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::CredentialCache;
use crate::error::{ConcourseError, ConcourseResult};
use crate::http::{Auth, BackendRequest, BackendResponse, HttpBackend, RequestBody};
use crate::models::ErrorBody;

const UNAUTHORIZED: u16 = 401;

pub struct ConcourseClient<B> {
    backend: Arc<B>,
    credentials: Arc<CredentialCache>,
    base_url: Url,
    team: String,
}

impl<B: HttpBackend> ConcourseClient<B> {
    pub fn new(
        backend: Arc<B>,
        credentials: Arc<CredentialCache>,
        base_url: Url,
        team: String,
    ) -> Self {
        Self {
            backend,
            credentials,
            base_url,
            team,
        }
    }

    /// Team used when a discovery caller does not name one.
    pub fn default_team(&self) -> &str {
        &self.team
    }

    /// Send an authenticated request, retrying once after a 401.
    ///
    /// Any other status is returned to the caller unchanged.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        streaming: bool,
    ) -> ConcourseResult<BackendResponse> {
        let url = self.base_url.join(path)?;
        let mut request = BackendRequest::new(method, url).with_body(body);
        if streaming {
            request = request.streaming();
        }

        debug!(method = %request.method, path = %path, "Concourse request");

        let token = self.credentials.get().await?;
        let response = self.dispatch(request.clone(), token.clone()).await?;
        debug!(path = %path, status = response.status, "Concourse response");

        if response.status != UNAUTHORIZED {
            return Ok(response);
        }

        info!(path = %path, "Concourse returned 401, refreshing token and retrying");
        drop(response);
        self.credentials.invalidate(&token).await;
        let token = self.credentials.get().await?;
        let response = self.dispatch(request, token).await?;

        if response.status == UNAUTHORIZED {
            warn!(path = %path, "Concourse rejected the refreshed token");
            return Err(ConcourseError::Unauthorized {
                path: path.to_string(),
            });
        }
        Ok(response)
    }

    async fn dispatch(
        &self,
        request: BackendRequest,
        token: String,
    ) -> ConcourseResult<BackendResponse> {
        self.backend
            .send(request.with_auth(Auth::Bearer(token)))
            .await
    }

    /// Send and require one of `accepted`; returns the buffered body.
    pub(crate) async fn send_expecting(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        accepted: &[u16],
    ) -> ConcourseResult<Bytes> {
        let response = self.send(method, path, body, false).await?;
        let status = response.status;
        let bytes = response.into_bytes().await?;
        if accepted.contains(&status) {
            Ok(bytes)
        } else {
            Err(api_error(status, path, &bytes))
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ConcourseResult<T> {
        let body = self
            .send_expecting(Method::GET, path, RequestBody::Empty, &[200])
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Build an error from a non-accepted response.
///
/// The message is the JSON `error` field when present, else the raw body,
/// else the status code.
pub(crate) fn api_error(status: u16, path: &str, body: &[u8]) -> ConcourseError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.is_empty() => parsed.error,
        _ => {
            let raw = String::from_utf8_lossy(body).trim().to_string();
            if raw.is_empty() {
                format!("HTTP {status}")
            } else {
                raw
            }
        }
    };
    ConcourseError::ApiRequestFailed {
        status,
        path: path.to_string(),
        message,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::client;
    use super::*;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use serde_json::json;

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let (client, backend) = client(
            FakeBackend::new()
                .with_token("t1", 3600)
                .with_response(Method::GET, "/api/v1/info", CannedResponse::json(200, &json!({}))),
        );

        let response = client
            .send(Method::GET, "api/v1/info", RequestBody::Empty, false)
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        let calls = backend.requests_to("/api/v1/info");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].bearer(), Some("t1"));
    }

    #[tokio::test]
    async fn test_retries_once_after_401_with_fresh_token() {
        let (client, backend) = client(
            FakeBackend::new()
                .with_token("t1", 3600)
                .with_token("t2", 3600)
                .with_response(Method::GET, "/api/v1/builds/42", CannedResponse::empty(401))
                .with_response(
                    Method::GET,
                    "/api/v1/builds/42",
                    CannedResponse::json(200, &json!({"id": 42})),
                ),
        );

        let body = client
            .send_expecting(Method::GET, "api/v1/builds/42", RequestBody::Empty, &[200])
            .await
            .unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&body).unwrap()["id"], 42);

        let calls = backend.requests_to("/api/v1/builds/42");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].bearer(), Some("t1"));
        assert_eq!(calls[1].bearer(), Some("t2"));
        assert_eq!(backend.requests_to("/sky/issuer/token").len(), 2);
    }

    #[tokio::test]
    async fn test_second_401_is_unauthorized_without_third_attempt() {
        let (client, backend) = client(
            FakeBackend::new()
                .with_token("t1", 3600)
                .with_response(Method::GET, "/api/v1/teams", CannedResponse::empty(401)),
        );

        let err = client
            .send(Method::GET, "api/v1/teams", RequestBody::Empty, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ConcourseError::Unauthorized { ref path } if path == "api/v1/teams"));
        assert_eq!(backend.requests_to("/api/v1/teams").len(), 2);
    }

    #[tokio::test]
    async fn test_other_statuses_are_not_retried() {
        let (client, backend) = client(
            FakeBackend::new()
                .with_token("t1", 3600)
                .with_response(Method::GET, "/api/v1/teams", CannedResponse::empty(403)),
        );

        let response = client
            .send(Method::GET, "api/v1/teams", RequestBody::Empty, false)
            .await
            .unwrap();
        assert_eq!(response.status, 403);
        assert_eq!(backend.requests_to("/api/v1/teams").len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_returned() {
        let (client, _backend) = client(
            FakeBackend::new()
                .with_token("t1", 3600)
                .with_response(Method::GET, "/api/v1/info", CannedResponse::unreachable()),
        );

        let err = client
            .send(Method::GET, "api/v1/info", RequestBody::Empty, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ConcourseError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_token_failure_skips_api_call() {
        let (client, backend) = client(FakeBackend::new().with_response(
            Method::POST,
            "/sky/issuer/token",
            CannedResponse::text(401, "bad credentials"),
        ));

        let err = client
            .send(Method::GET, "api/v1/info", RequestBody::Empty, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ConcourseError::TokenRejected { status: 401, .. }));
        assert!(backend.requests_to("/api/v1/info").is_empty());
    }

    #[test]
    fn test_api_error_message_sources() {
        let from_json = api_error(500, "p", br#"{"error":"boom"}"#);
        assert!(matches!(from_json, ConcourseError::ApiRequestFailed { ref message, .. } if message == "boom"));

        let from_text = api_error(500, "p", b"plain failure\n");
        assert!(matches!(from_text, ConcourseError::ApiRequestFailed { ref message, .. } if message == "plain failure"));

        let from_status = api_error(418, "p", b"");
        assert!(matches!(from_status, ConcourseError::ApiRequestFailed { status: 418, ref message, .. } if message == "HTTP 418"));
    }
}
