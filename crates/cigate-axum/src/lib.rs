#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use chrono as _;
#[cfg(test)]
use cigate_concourse as _;
#[cfg(test)]
use reqwest as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod request_id;
pub mod routes;
pub mod sse;
pub mod state;

// Re-export primary types
pub use auth::{ApiKey, ApiKeys};
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, serve, shutdown_signal, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
