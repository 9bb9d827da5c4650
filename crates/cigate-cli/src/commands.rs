//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on (overrides SERVER_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List configured jobs
    Jobs,

    /// Trigger a run of a configured job
    Trigger {
        /// Job id from the jobs file
        job_id: String,
        /// Build parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Idempotency key recorded with the trigger
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Show the status of a run
    Status {
        /// Run id (team:pipeline:job:build_id)
        run_id: String,
    },

    /// Stream run events to stdout until the run ends or Ctrl-C
    Events {
        /// Run id (team:pipeline:job:build_id)
        run_id: String,
    },

    /// Cancel a run
    Cancel {
        /// Run id (team:pipeline:job:build_id)
        run_id: String,
    },
}

/// Parse `key=value`; the value may itself contain `=`.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
