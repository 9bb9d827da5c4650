//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core needs from adapters (the CI
//! provider, event sinks) and the interface the core offers to front ends
//! (`GatewayPort`). No adapter-specific types appear here.

mod event_sink;
mod gateway;
pub mod provider;

use thiserror::Error;

pub use event_sink::{EventSink, WriterSink};
pub use gateway::GatewayPort;
pub use provider::{CiProvider, DiscoveryCapable, ProviderError, ProviderResult};

/// Core error type for gateway operations.
///
/// This is the small, fixed set of error kinds front ends map to their own
/// representations (HTTP status codes, CLI exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// No job with this id is configured.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The run does not exist, or its id is malformed.
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// A discovery resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the gateway's credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend is unreachable or failing.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the request with a client error.
    #[error("Provider error {code}: {message}")]
    Provider {
        /// 4xx status reported by the backend
        code: u16,
        /// Backend-supplied message
        message: String,
    },

    /// Job configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider does not support the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound { resource } => Self::NotFound(resource),
            ProviderError::Unauthorized { message } => Self::Unauthorized(message),
            ProviderError::Unavailable { message } => Self::Unavailable(message),
            ProviderError::MalformedReference { reference, .. } => Self::RunNotFound(reference),
            ProviderError::InvalidJobRef { message } => Self::Configuration(message),
            ProviderError::Api { code, message } if (400..500).contains(&code) => {
                Self::Provider { code, message }
            }
            ProviderError::Api { code, message } => {
                Self::Unavailable(format!("backend returned {code}: {message}"))
            }
            ProviderError::InvalidResponse { message } => Self::Unavailable(message),
            ProviderError::Sink(e) => Self::Internal(format!("event sink: {e}")),
        }
    }
}

// Front ends hold the gateway as `Arc<dyn GatewayPort>`.
const _: fn(std::sync::Arc<dyn GatewayPort>) = |_| {};
