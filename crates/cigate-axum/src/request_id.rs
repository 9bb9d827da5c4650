//! Request ids and the per-request tracing span.
//!
//! `SetRequestIdLayer` assigns an id (the caller's `X-Request-ID`, or a fresh
//! UUID v4) before anything else runs; `PropagateRequestIdLayer` echoes it on
//! the response. [`stamp_error_bodies`] writes it into JSON error bodies.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;

use crate::error::ErrorDetail;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// The request id assigned to this request, or an empty string outside the
/// request-id layers.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Span wrapping each request. `api_key` is filled in after authentication.
pub fn request_span(req: &axum::http::Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(req.headers()),
        method = %req.method(),
        path = %req.uri().path(),
        api_key = tracing::field::Empty,
    )
}

/// Re-render error responses so their body carries the request id.
pub async fn stamp_error_bodies(req: Request, next: Next) -> Response {
    let id = request_id(req.headers());
    let response = next.run(req).await;

    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };
    if id.is_empty() {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let (stamped, body) = detail.render(Some(&id)).into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = stamped.headers.get(header::CONTENT_TYPE) {
        parts.headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, body)
}
