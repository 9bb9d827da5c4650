//! Bearer token acquisition and caching.
//!
//! At most one token is cached per adapter. Readers share a read lock on the
//! fast path; a stale or missing token is refreshed under the write lock with
//! a second freshness check, so concurrent callers cause at most one fetch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ConcourseError, ConcourseResult};
use crate::http::{Auth, BackendRequest, HttpBackend, RequestBody};
use crate::models::{ErrorBody, TokenResponse};

/// Public client id and secret of the `fly` CLI, accepted by every
/// Concourse `sky` issuer.
const FLY_CLIENT_ID: &str = "fly";
const FLY_CLIENT_SECRET: &str = "Zmx5";

/// Source of monotonic time for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A token as issued, before it is pinned to a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: Duration,
}

/// Obtains a fresh token from the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> ConcourseResult<IssuedToken>;
}

/// OAuth2 password grant against the `sky` issuer.
pub struct PasswordGrantFetcher<B> {
    backend: Arc<B>,
    token_url: Url,
    username: String,
    password: String,
}

impl<B: HttpBackend> PasswordGrantFetcher<B> {
    pub fn new(backend: Arc<B>, token_url: Url, username: String, password: String) -> Self {
        Self {
            backend,
            token_url,
            username,
            password,
        }
    }
}

#[async_trait]
impl<B: HttpBackend> TokenFetcher for PasswordGrantFetcher<B> {
    async fn fetch(&self) -> ConcourseResult<IssuedToken> {
        let form = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
            ("scope".to_string(), "openid".to_string()),
        ];
        let request = BackendRequest::new(Method::POST, self.token_url.clone())
            .with_auth(Auth::Basic {
                username: FLY_CLIENT_ID.to_string(),
                password: FLY_CLIENT_SECRET.to_string(),
            })
            .with_body(RequestBody::Form(form));

        let response = self.backend.send(request).await?;
        let status = response.status;
        let success = response.is_success();
        let body = response.into_bytes().await?;

        if !success {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
            warn!(status, username = %self.username, "Concourse token request rejected");
            return Err(ConcourseError::TokenRejected { status, message });
        }

        let token: TokenResponse = serde_json::from_slice(&body)?;
        if token.access_token.is_empty() {
            return Err(ConcourseError::InvalidResponse {
                message: "token endpoint returned an empty access_token".to_string(),
            });
        }

        Ok(IssuedToken {
            access_token: token.access_token,
            expires_in: Duration::from_secs(token.expires_in),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

enum TokenSource {
    /// Pre-supplied, never refreshed.
    Static(String),
    Fetch(Arc<dyn TokenFetcher>),
}

/// Process-wide bearer token cache.
pub struct CredentialCache {
    state: RwLock<Option<CachedToken>>,
    source: TokenSource,
    clock: Arc<dyn Clock>,
    refresh_margin: Duration,
}

impl CredentialCache {
    /// A cache that always serves `token`.
    pub fn with_static_token(token: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(None),
            source: TokenSource::Static(token.into()),
            clock: Arc::new(SystemClock),
            refresh_margin: Duration::ZERO,
        }
    }

    /// A cache that fetches through `fetcher` whenever the cached token is
    /// missing or expires within `refresh_margin`.
    pub fn with_fetcher(fetcher: Arc<dyn TokenFetcher>, refresh_margin: Duration) -> Self {
        Self {
            state: RwLock::new(None),
            source: TokenSource::Fetch(fetcher),
            clock: Arc::new(SystemClock),
            refresh_margin,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return a token valid for at least the refresh margin.
    pub async fn get(&self) -> ConcourseResult<String> {
        let fetcher = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Fetch(fetcher) => fetcher,
        };

        if let Some(token) = self.fresh(self.state.read().await.as_ref()) {
            return Ok(token);
        }

        let mut state = self.state.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = self.fresh(state.as_ref()) {
            return Ok(token);
        }

        debug!("Fetching Concourse token");
        let issued = fetcher.fetch().await?;
        let expires_at = self.clock.now() + issued.expires_in;
        info!(expires_in_secs = issued.expires_in.as_secs(), "Obtained Concourse token");

        *state = Some(CachedToken {
            token: issued.access_token.clone(),
            expires_at,
        });
        Ok(issued.access_token)
    }

    /// Drop the cached token if it is still `rejected`.
    ///
    /// A token that was already replaced by a concurrent refresh is kept.
    pub async fn invalidate(&self, rejected: &str) {
        if matches!(self.source, TokenSource::Static(_)) {
            return;
        }
        let mut state = self.state.write().await;
        if state.as_ref().is_some_and(|cached| cached.token == rejected) {
            debug!("Invalidating rejected Concourse token");
            *state = None;
        }
    }

    fn fresh(&self, cached: Option<&CachedToken>) -> Option<String> {
        let cached = cached?;
        let deadline = self.clock.now().checked_add(self.refresh_margin)?;
        (deadline < cached.expires_at).then(|| cached.token.clone())
    }
}
