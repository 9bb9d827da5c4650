//! API key authentication for the `/v1` routes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::HttpError;

/// A named API key. The name shows up in logs, the key never does.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub name: String,
    pub key: String,
}

impl ApiKey {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Set of accepted keys, indexed by key value.
#[derive(Clone, Default)]
pub struct ApiKeys {
    by_key: Arc<HashMap<String, String>>,
}

impl ApiKeys {
    pub fn new(keys: impl IntoIterator<Item = ApiKey>) -> Self {
        let by_key = keys.into_iter().map(|k| (k.key, k.name)).collect();
        Self {
            by_key: Arc::new(by_key),
        }
    }

    /// Name of the client owning `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.by_key.values().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ApiKeys").field("names", &names).finish()
    }
}

/// Why an `Authorization` header was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthFailure {
    Missing,
    Malformed,
    UnknownKey,
}

impl AuthFailure {
    const fn message(self) -> &'static str {
        match self {
            Self::Missing => "missing authorization header",
            Self::Malformed => "invalid authorization format, expected 'Bearer <token>'",
            Self::UnknownKey => "invalid api key",
        }
    }
}

/// Resolve an `Authorization` header value to the key's name.
pub(crate) fn authenticate<'a>(
    keys: &'a ApiKeys,
    header: Option<&str>,
) -> Result<&'a str, AuthFailure> {
    let header = header.ok_or(AuthFailure::Missing)?;
    let token = header
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or(AuthFailure::Malformed)?;
    keys.lookup(token).ok_or(AuthFailure::UnknownKey)
}

/// Auth middleware: validate `Authorization: Bearer <key>`.
///
/// On success the key name is recorded on the request span. On failure the
/// request never reaches the handler and a 401 with `WWW-Authenticate: Bearer`
/// is returned.
pub async fn require_api_key(keys: ApiKeys, req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match authenticate(&keys, header) {
        Ok(name) => {
            tracing::Span::current().record("api_key", name);
            next.run(req).await
        }
        Err(failure) => {
            tracing::warn!(
                path = %req.uri().path(),
                reason = failure.message(),
                "Unauthorized API request"
            );
            HttpError::Unauthenticated(failure.message().to_string()).into_response()
        }
    }
}
