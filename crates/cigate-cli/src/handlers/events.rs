//! `cigate events`: relay run events to stdout.

use anyhow::Result;
use cigate_core::WriterSink;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::runs::check_run_id;

/// Stream until the run's event stream ends or Ctrl-C is pressed.
pub async fn execute(ctx: &CliContext, run_id: &str) -> Result<()> {
    check_run_id(ctx, run_id)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut sink = WriterSink::new(tokio::io::stdout());
    let result = ctx
        .gateway
        .stream_run_events(run_id, &mut sink, &cancel)
        .await;
    watcher.abort();

    if cancel.is_cancelled() {
        tracing::info!(run_id, "Event stream interrupted");
    }
    result.map_err(CliError::from)?;
    Ok(())
}
