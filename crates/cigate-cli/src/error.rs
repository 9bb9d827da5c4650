//! CLI-specific error types and mappings.
//!
//! This module provides error types for the CLI adapter and mappings
//! from CoreError to exit codes.

use cigate_core::CoreError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Job, run, or resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Configuration error (environment, jobs file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The CI backend is unreachable or failing.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The CI backend rejected the gateway's credentials.
    #[error("Backend authentication failed: {0}")]
    Unauthorized(String),

    /// Anything else reported by the gateway.
    #[error("{0}")]
    Core(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 69: Backend unavailable (`EX_UNAVAILABLE`)
    /// - 77: Backend rejected credentials (`EX_NOPERM`)
    /// - 78: Configuration error (`EX_CONFIG`)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) | Self::Core(_) => 1,
            Self::Arguments(_) => 2,
            Self::Unavailable(_) => 69,
            Self::Unauthorized(_) => 77,
            Self::Config(_) => 78,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            e @ (CoreError::JobNotFound(_) | CoreError::RunNotFound(_) | CoreError::NotFound(_)) => {
                Self::NotFound(e.to_string())
            }
            CoreError::Unauthorized(msg) => Self::Unauthorized(msg),
            CoreError::Unavailable(msg) => Self::Unavailable(msg),
            CoreError::Configuration(msg) => Self::Config(msg),
            e @ (CoreError::Provider { .. } | CoreError::Unsupported(_) | CoreError::Internal(_)) => {
                Self::Core(e.to_string())
            }
        }
    }
}

/// Exit code for an error that reached `main`.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}
