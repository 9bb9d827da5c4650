#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]
// The backend generic is an implementation detail; callers use
// `DefaultConcourseProvider` through the core port traits.
#![allow(private_interfaces, private_bounds)]

mod auth;
mod client;
mod config;
mod error;
mod events;
mod http;
mod mapper;
mod models;
mod paths;
mod port;
mod reference;

// ============================================================================
// Public API
// ============================================================================

// Provider
pub use port::{ConcourseProvider, DefaultConcourseProvider, PROVIDER_KIND};

// Configuration
pub use config::{ConcourseClientConfig, ConfigError};

// Errors
pub use error::ConcourseError;

// References
pub use reference::{ConcourseJobRef, ConcourseRunRef};

/// In-memory HTTP backend for tests in dependent crates.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    pub use crate::http::testing::{CannedResponse, FakeBackend, RecordedRequest};
    pub use reqwest::Method;
}

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
