//! `cigate trigger`, `cigate status` and `cigate cancel`.

use anyhow::Result;
use cigate_core::TriggerParams;
use serde_json::Value;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::run_summary;

/// Build trigger parameters from `key=value` pairs. Values stay strings;
/// a repeated key keeps its last value.
pub fn trigger_params(params: Vec<(String, String)>, idempotency_key: Option<String>) -> TriggerParams {
    TriggerParams {
        parameters: params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
        idempotency_key,
    }
}

pub async fn trigger(
    ctx: &CliContext,
    job_id: &str,
    params: Vec<(String, String)>,
    idempotency_key: Option<String>,
) -> Result<()> {
    let run = ctx
        .gateway
        .trigger_run(job_id, trigger_params(params, idempotency_key))
        .await
        .map_err(CliError::from)?;
    println!("{}", run_summary(&run));
    Ok(())
}

/// Reject ids that are not `team:pipeline:job:build_id` before any backend call.
pub fn check_run_id(ctx: &CliContext, run_id: &str) -> Result<(), CliError> {
    ctx.gateway.check_run_id(run_id).map_err(|_| {
        CliError::Arguments(format!(
            "'{run_id}' is not a run id (expected team:pipeline:job:build_id)"
        ))
    })
}

pub async fn status(ctx: &CliContext, run_id: &str) -> Result<()> {
    check_run_id(ctx, run_id)?;
    let run = ctx.gateway.get_run(run_id).await.map_err(CliError::from)?;
    println!("{}", run_summary(&run));
    Ok(())
}

pub async fn cancel(ctx: &CliContext, run_id: &str) -> Result<()> {
    check_run_id(ctx, run_id)?;
    ctx.gateway.cancel_run(run_id).await.map_err(CliError::from)?;
    println!("Cancelled {run_id}");
    Ok(())
}
