//! HTTP request handlers.
//!
//! Handlers are thin wrappers that delegate to the `GatewayPort`.

pub mod discovery;
pub mod health;
pub mod jobs;
pub mod runs;
