//! Internal error types for Concourse operations.
//!
//! These errors are internal to `cigate-concourse` and are mapped to core
//! port errors at the boundary (see `port.rs`).

use thiserror::Error;

/// Result type alias for Concourse operations.
pub type ConcourseResult<T> = Result<T, ConcourseError>;

/// Errors related to Concourse API operations.
#[derive(Debug, Error)]
pub enum ConcourseError {
    /// The API answered with a status the caller did not accept.
    #[error("Concourse request to {path} failed with status {status}: {message}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// API path that was requested
        path: String,
        /// Message extracted from the response body
        message: String,
    },

    /// The API rejected a freshly fetched token as well.
    #[error("Concourse rejected credentials for {path} after token refresh")]
    Unauthorized {
        /// API path that was requested
        path: String,
    },

    /// The token endpoint refused to issue a token.
    #[error("Concourse token request failed with status {status}: {message}")]
    TokenRejected {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Connection-level failure outside reqwest (body read, stream reset).
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the failure
        message: String,
    },

    /// API returned an invalid or unexpected response.
    #[error("Invalid response from Concourse: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A public run id did not decode.
    #[error("Malformed run reference '{reference}': {reason}")]
    MalformedReference {
        /// The rejected identifier
        reference: String,
        /// Why it was rejected
        reason: String,
    },

    /// A job's provider reference is unusable.
    #[error("Invalid Concourse job reference: {message}")]
    InvalidJobRef {
        /// What's wrong with the reference
        message: String,
    },

    /// A team, pipeline or job name that cannot address a single path segment.
    #[error("'{name}' is not a valid Concourse name")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// The event sink refused a frame.
    #[error("Event sink error: {0}")]
    Sink(#[source] std::io::Error),
}
