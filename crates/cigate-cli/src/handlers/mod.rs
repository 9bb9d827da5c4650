//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that call the `GatewayPort` and format the result for
//!   the terminal. Gateway errors are converted to `CliError` so `main` can
//!   pick the exit code.

pub mod events;
pub mod jobs;
pub mod runs;
pub mod serve;
