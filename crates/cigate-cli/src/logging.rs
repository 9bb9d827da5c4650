//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level, so per-module
//! filters stay available without extra flags.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::CliError;

/// Build the filter: `RUST_LOG` if set, otherwise `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter, CliError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| CliError::Config(format!("LOG_LEVEL: invalid level '{level}': {e}"))),
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CliError> {
    let filter = env_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
    // Only the first initialization in a process takes effect.
    result.ok();
    Ok(())
}
