//! Terminal formatting for command output.

use cigate_core::{Job, Run};

/// Truncates a string to a maximum length, adding "..." if needed.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "--" } else { s }
}

/// Render configured jobs as a table.
pub fn jobs_table(jobs: &[Job]) -> String {
    let mut out = format!(
        "{:<24} {:<16} {:<28} {:<10} {}\n",
        "JOB ID", "PROJECT", "DISPLAY NAME", "ENV", "PROVIDER"
    );
    out.push_str(&"-".repeat(90));
    out.push('\n');

    for job in jobs {
        out.push_str(&format!(
            "{:<24} {:<16} {:<28} {:<10} {}\n",
            truncate_string(&job.job_id, 23),
            truncate_string(or_dash(&job.project), 15),
            truncate_string(or_dash(&job.display_name), 27),
            truncate_string(or_dash(&job.environment), 9),
            job.provider.kind,
        ));
    }
    out
}

/// Render a run as aligned `key: value` lines.
pub fn run_summary(run: &Run) -> String {
    let mut lines = vec![format!("run_id:      {}", run.run_id)];
    if let Some(job_id) = &run.job_id {
        lines.push(format!("job_id:      {job_id}"));
    }
    lines.push(format!("status:      {}", run.status));
    lines.push(format!("created_at:  {}", run.created_at.to_rfc3339()));
    if let Some(started) = run.started_at {
        lines.push(format!("started_at:  {}", started.to_rfc3339()));
    }
    if let Some(finished) = run.finished_at {
        lines.push(format!("finished_at: {}", finished.to_rfc3339()));
    }
    lines.join("\n")
}
