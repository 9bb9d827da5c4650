//! Gateway configuration from environment variables.
//!
//! `.env` is loaded by `main` before this runs; command-line flags override
//! the values read here.

use std::path::PathBuf;
use std::time::Duration;

use cigate_axum::{ApiKey, ServerConfig};
use cigate_concourse::ConcourseClientConfig;

use crate::error::CliError;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_JOBS_FILE: &str = "configs/jobs.yaml";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(CliError::Config(format!(
                "LOG_FORMAT must be 'json' or 'text', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcourseSettings {
    pub url: String,
    pub team: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    pub token_refresh_margin: Duration,
}

impl ConcourseSettings {
    pub fn client_config(&self) -> ConcourseClientConfig {
        let config = ConcourseClientConfig::new()
            .with_base_url(&self.url)
            .with_team(&self.team)
            .with_optional_bearer_token(self.bearer_token.clone())
            .with_refresh_margin(self.token_refresh_margin);

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => config.with_credentials(username, password),
            _ => config,
        }
    }
}

/// Everything the gateway reads at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub shutdown_timeout: Duration,
    pub api_keys: Vec<ApiKey>,
    pub concourse: ConcourseSettings,
    pub logging: LoggingConfig,
    pub jobs_file: PathBuf,
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| CliError::Config(format!("SERVER_PORT: invalid port '{raw}'")))?,
            None => DEFAULT_PORT,
        };

        let duration = |key: &str, default: Duration| match get(key) {
            Some(raw) => parse_duration(&raw).map_err(|e| CliError::Config(format!("{key}: {e}"))),
            None => Ok(default),
        };

        let url = get("CONCOURSE_URL")
            .ok_or_else(|| CliError::Config("CONCOURSE_URL is required".to_string()))?;

        let format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            port,
            shutdown_timeout: duration("SERVER_SHUTDOWN_TIMEOUT", Duration::from_secs(30))?,
            api_keys: get("API_KEYS").map(|raw| parse_api_keys(&raw)).transpose()?.unwrap_or_default(),
            concourse: ConcourseSettings {
                url,
                team: get("CONCOURSE_TEAM").unwrap_or_else(|| "main".to_string()),
                username: get("CONCOURSE_USERNAME"),
                password: get("CONCOURSE_PASSWORD"),
                bearer_token: get("CONCOURSE_BEARER_TOKEN"),
                token_refresh_margin: duration(
                    "CONCOURSE_TOKEN_REFRESH_MARGIN",
                    Duration::from_secs(5 * 60),
                )?,
            },
            logging: LoggingConfig {
                level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                format,
            },
            jobs_file: get("JOBS_FILE").map_or_else(|| PathBuf::from(DEFAULT_JOBS_FILE), PathBuf::from),
        })
    }

    /// API keys are only needed by the HTTP server.
    pub fn require_api_keys(&self) -> Result<(), CliError> {
        if self.api_keys.is_empty() {
            return Err(CliError::Config("API_KEYS is required".to_string()));
        }
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::default()
            .with_port(self.port)
            .with_shutdown_timeout(self.shutdown_timeout)
    }
}

/// Parse `name:key,name:key`.
pub fn parse_api_keys(raw: &str) -> Result<Vec<ApiKey>, CliError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, key) = pair
                .split_once(':')
                .map(|(n, k)| (n.trim(), k.trim()))
                .filter(|(n, k)| !n.is_empty() && !k.is_empty())
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "API_KEYS: invalid entry '{}' (expected name:key)",
                        pair.split(':').next().unwrap_or_default()
                    ))
                })?;
            Ok(ApiKey::new(name, key))
        })
        .collect()
}

/// Parse durations such as `500ms`, `30s`, `5m`, `1h` or `1h30m`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{input}'"))?;
        if digits == 0 {
            return Err(format!("invalid duration '{input}'"));
        }
        let value: f64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid number in duration '{input}'"))?;

        let unit_len = rest[digits..]
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len() - digits);
        let seconds = match &rest[digits..digits + unit_len] {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            unit => return Err(format!("unknown unit '{unit}' in duration '{input}'")),
        };
        total += Duration::try_from_secs_f64(seconds)
            .map_err(|_| format!("duration '{input}' out of range"))?;
        rest = &rest[digits + unit_len..];
    }
    Ok(total)
}
