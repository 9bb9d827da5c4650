//! Axum-specific error types and mappings.
//!
//! Handlers return [`HttpError`]; `CoreError` converts into it so handlers can
//! use `?` on gateway calls. Every error renders as
//! `{"error": {"message", "code", "request_id"}}`. The request id is filled in
//! by the request-id middleware, which finds the [`ErrorDetail`] extension on
//! the response.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use cigate_core::CoreError;
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Job, run, or discovery resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The caller did not present a valid API key.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The CI backend rejected the gateway's credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The CI backend is unreachable or failing.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// The CI backend rejected the request with a client error.
    #[error("Upstream error {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    /// The provider does not support the operation.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Service is not ready to serve.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Upstream { status, .. } => *status,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Unauthenticated(msg)
            | Self::Unauthorized(msg)
            | Self::BadGateway(msg)
            | Self::NotImplemented(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Internal(msg) => msg,
            Self::Upstream { message, .. } => message,
        }
    }
}

/// Status and message of an error response, kept as a response extension so
/// outer middleware can re-render the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub status: StatusCode,
    pub message: String,
}

impl ErrorDetail {
    /// Render the JSON error body, optionally stamped with a request id.
    pub fn render(&self, request_id: Option<&str>) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                message: &self.message,
                code: self.status.as_u16(),
                request_id,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let detail = ErrorDetail {
            status: self.status(),
            message: self.message().to_string(),
        };

        if detail.status.is_server_error() {
            tracing::error!(status = detail.status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = detail.status.as_u16(), error = %self, "Request rejected");
        }

        let mut response = detail.render(None);
        if matches!(self, Self::Unauthenticated(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::JobNotFound(id) => Self::NotFound(format!("job not found: {id}")),
            CoreError::RunNotFound(id) => Self::NotFound(format!("run not found: {id}")),
            CoreError::NotFound(resource) => Self::NotFound(format!("not found: {resource}")),
            CoreError::Unauthorized(msg) => {
                tracing::warn!(error = %msg, "Backend rejected gateway credentials");
                Self::Unauthorized("provider authentication failed".to_string())
            }
            CoreError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Backend unavailable");
                Self::BadGateway("provider temporarily unavailable".to_string())
            }
            CoreError::Provider { code, message } => match StatusCode::from_u16(code) {
                Ok(status) if status.is_client_error() => Self::Upstream { status, message },
                _ => Self::BadGateway("provider error".to_string()),
            },
            CoreError::Unsupported(msg) => Self::NotImplemented(msg),
            CoreError::Configuration(msg) => Self::Internal(format!("configuration: {msg}")),
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal gateway error");
                Self::Internal("internal server error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_core_error_status_mapping() {
        let cases = [
            (CoreError::JobNotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::RunNotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (CoreError::Unavailable("x".into()), StatusCode::BAD_GATEWAY),
            (
                CoreError::Provider {
                    code: 409,
                    message: "conflict".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                CoreError::Provider {
                    code: 500,
                    message: "boom".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (CoreError::Unsupported("x".into()), StatusCode::NOT_IMPLEMENTED),
            (CoreError::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (CoreError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (core, expected) in cases {
            let label = core.to_string();
            assert_eq!(HttpError::from(core).status(), expected, "{label}");
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = HttpError::from(CoreError::JobNotFound("deploy".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorDetail>().is_some());

        assert_eq!(
            body_json(response).await,
            json!({"error": {"message": "job not found: deploy", "code": 404}})
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let response = HttpError::from(CoreError::Internal("lock poisoned".into())).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "internal server error");
    }

    #[tokio::test]
    async fn test_upstream_message_is_passed_through() {
        let response = HttpError::from(CoreError::Provider {
            code: 422,
            message: "pipeline is paused".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["message"], "pipeline is paused");
    }

    #[test]
    fn test_only_caller_auth_failures_carry_challenge() {
        let caller = HttpError::Unauthenticated("invalid api key".into()).into_response();
        assert_eq!(caller.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let backend = HttpError::from(CoreError::Unauthorized("token expired".into())).into_response();
        assert!(backend.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_render_with_request_id() {
        let detail = ErrorDetail {
            status: StatusCode::BAD_REQUEST,
            message: "invalid build_id".to_string(),
        };
        let body = body_json(detail.render(Some("req-1"))).await;
        assert_eq!(body["error"]["request_id"], "req-1");
        assert_eq!(body["error"]["code"], 400);
    }
}
