//! Public configuration for the Concourse adapter.
//!
//! This module provides a stable public API for configuring the adapter.
//! Validation happens once, when the provider is constructed.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Errors detected while turning a [`ConcourseClientConfig`] into a provider.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid Concourse URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Concourse team must not be empty")]
    MissingTeam,

    #[error("Concourse credentials required: set a bearer token or both username and password")]
    MissingCredentials,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// How the adapter obtains bearer tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AuthMode {
    /// Pre-supplied token, never refreshed.
    Static(String),
    /// Password grant against the `sky` issuer.
    Password { username: String, password: String },
}

/// Configuration for the Concourse adapter.
///
/// Use the builder pattern methods to customize the configuration.
///
/// # Example
///
/// ```
/// use cigate_concourse::ConcourseClientConfig;
/// use std::time::Duration;
///
/// let config = ConcourseClientConfig::new()
///     .with_base_url("https://ci.example.com")
///     .with_bearer_token("token")
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ConcourseClientConfig {
    /// Base URL of the Concourse web node
    pub(crate) base_url: String,
    /// Default team for discovery calls
    pub(crate) team: String,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    /// Pre-supplied token; takes precedence over username/password
    pub(crate) bearer_token: Option<String>,
    /// Lead time before expiry at which a cached token counts as stale
    pub(crate) refresh_margin: Duration,
    /// Timeout for connecting and for non-streaming requests
    pub(crate) timeout: Duration,
    pub(crate) user_agent: String,
}

impl Default for ConcourseClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            team: "main".to_string(),
            username: None,
            password: None,
            bearer_token: None,
            refresh_margin: Duration::from_secs(5 * 60),
            timeout: Duration::from_secs(30),
            user_agent: concat!("cigate-concourse/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConcourseClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Concourse base URL.
    ///
    /// Defaults to `http://localhost:8080`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default team used by discovery calls.
    ///
    /// Defaults to `main`.
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    /// Authenticate with a local user through the password grant.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Use a pre-supplied bearer token instead of the password grant.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set an optional bearer token.
    #[must_use]
    pub fn with_optional_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    /// Set the token refresh margin.
    ///
    /// Defaults to 5 minutes.
    #[must_use]
    pub const fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Set the request timeout.
    ///
    /// Applies to connection setup and to every non-streaming request.
    /// Event streams are only bounded by the connect timeout. Defaults to
    /// 30 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string for HTTP requests.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Parse the base URL, normalizing it to end with `/` so relative API
    /// paths join underneath it.
    pub(crate) fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(self.base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub(crate) fn auth_mode(&self) -> Result<AuthMode, ConfigError> {
        if let Some(token) = self.bearer_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(AuthMode::Static(token.to_string()));
        }
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() => Ok(AuthMode::Password {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    pub(crate) fn validated_team(&self) -> Result<String, ConfigError> {
        let team = self.team.trim();
        if team.is_empty() {
            return Err(ConfigError::MissingTeam);
        }
        Ok(team.to_string())
    }
}
