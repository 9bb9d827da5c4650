#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;

// Only used by the binary
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod logging;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use config::{GatewayConfig, LogFormat, LoggingConfig};
pub use error::{CliError, exit_code_for};
pub use logging::init_logging;
pub use parser::Cli;
