//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the gateway is wired together:
//! jobs file → registry, configuration → Concourse provider, both →
//! `GatewayService`. Commands and the HTTP server only see the resulting
//! `GatewayPort`.

use std::sync::Arc;

use cigate_concourse::DefaultConcourseProvider;
use cigate_core::{GatewayPort, GatewayService};

use crate::config::GatewayConfig;
use crate::error::CliError;
use crate::jobs::load_jobs;

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub config: GatewayConfig,
    pub gateway: Arc<dyn GatewayPort>,
}

/// Load jobs, build the provider and assemble the gateway service.
pub fn bootstrap(config: GatewayConfig) -> Result<CliContext, CliError> {
    let registry = load_jobs(&config.jobs_file)?;

    let provider = DefaultConcourseProvider::new(&config.concourse.client_config())
        .map_err(|e| CliError::Config(e.to_string()))?;
    tracing::info!(
        url = %config.concourse.url,
        team = %config.concourse.team,
        "Initialized Concourse provider"
    );

    let gateway: Arc<dyn GatewayPort> = Arc::new(GatewayService::new(provider, registry));
    Ok(CliContext { config, gateway })
}
