//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;
use crate::config::{GatewayConfig, LogFormat};

/// Stateless CI gateway: trigger, observe and cancel CI jobs through one API.
///
/// Configuration comes from the environment (and `.env`); the global flags
/// below override it for a single invocation.
#[derive(Parser)]
#[command(name = "cigate")]
#[command(version)]
pub struct Cli {
    /// Jobs file to load (overrides JOBS_FILE)
    #[arg(long = "jobs-file", global = true)]
    pub jobs_file: Option<PathBuf>,

    /// Log level or filter directive (overrides LOG_LEVEL)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Log output format (overrides LOG_FORMAT)
    #[arg(long = "log-format", global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply global flag overrides on top of the environment configuration.
    pub fn apply_overrides(&self, config: &mut GatewayConfig) {
        if let Some(path) = &self.jobs_file {
            config.jobs_file.clone_from(path);
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Commands::Serve { port: Some(port) } = self.command {
            config.port = port;
        }
    }
}
