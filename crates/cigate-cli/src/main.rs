//! CLI entry point.
//!
//! Configuration is read once here, logging is initialized, and the
//! gateway is composed by `bootstrap` before dispatching to a handler.

use std::process::ExitCode;

use clap::Parser;

use cigate_cli::{Cli, Commands, GatewayConfig, bootstrap, exit_code_for, handlers, init_logging};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = GatewayConfig::from_env()?;
    cli.apply_overrides(&mut config);
    init_logging(&config.logging)?;

    let ctx = bootstrap(config)?;

    match cli.command {
        Commands::Serve { .. } => handlers::serve::execute(ctx).await,
        Commands::Jobs => handlers::jobs::execute(&ctx),
        Commands::Trigger {
            job_id,
            params,
            idempotency_key,
        } => handlers::runs::trigger(&ctx, &job_id, params, idempotency_key).await,
        Commands::Status { run_id } => handlers::runs::status(&ctx, &run_id).await,
        Commands::Events { run_id } => handlers::events::execute(&ctx, &run_id).await,
        Commands::Cancel { run_id } => handlers::runs::cancel(&ctx, &run_id).await,
    }
}
