//! `cigate jobs`

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::jobs_table;

pub fn execute(ctx: &CliContext) -> Result<()> {
    let jobs = ctx.gateway.list_jobs();
    if jobs.is_empty() {
        println!("No jobs configured in {}.", ctx.config.jobs_file.display());
        return Ok(());
    }
    print!("{}", jobs_table(&jobs));
    Ok(())
}
