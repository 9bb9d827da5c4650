//! Error types for CI provider port operations.

use thiserror::Error;

/// Errors from CI provider port operations.
///
/// These are domain-level errors that the gateway service translates.
/// Implementation-specific errors (HTTP, JSON) are mapped to these by the
/// adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend reported that the addressed resource does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// What was being looked up
        resource: String,
    },

    /// Credentials were rejected after the single allowed retry.
    #[error("Provider authentication failed: {message}")]
    Unauthorized {
        /// Backend-supplied detail
        message: String,
    },

    /// The backend could not be reached or reported itself unavailable.
    #[error("Provider temporarily unavailable: {message}")]
    Unavailable {
        /// Description of the failure
        message: String,
    },

    /// A public run identifier did not parse.
    #[error("Malformed run reference '{reference}': {reason}")]
    MalformedReference {
        /// The rejected identifier
        reference: String,
        /// Why it was rejected
        reason: String,
    },

    /// A job's provider reference is missing keys or has the wrong shape.
    #[error("Invalid job reference: {message}")]
    InvalidJobRef {
        /// What's wrong with the reference
        message: String,
    },

    /// Any other non-success backend response.
    #[error("Provider error {code}: {message}")]
    Api {
        /// Backend HTTP status code
        code: u16,
        /// Backend-supplied message
        message: String,
    },

    /// The backend answered with something the adapter could not decode.
    #[error("Invalid provider response: {message}")]
    InvalidResponse {
        /// What was invalid
        message: String,
    },

    /// Writing to the event sink failed (usually a disconnected client).
    #[error("Event sink failed: {0}")]
    Sink(#[source] std::io::Error),
}

/// Result type alias for provider port operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
