//! `cigate serve`: run the HTTP API.

use anyhow::Result;
use cigate_axum::{ApiKeys, AxumContext, start_server};

use crate::bootstrap::CliContext;

pub async fn execute(ctx: CliContext) -> Result<()> {
    ctx.config.require_api_keys()?;

    let server_config = ctx.config.server_config();
    let keys = ApiKeys::new(ctx.config.api_keys.iter().cloned());
    start_server(AxumContext::new(ctx.gateway, keys), server_config).await
}
