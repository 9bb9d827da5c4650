//! Jobs file loading.

use std::path::Path;

use cigate_core::{Job, JobProvider, JobRegistry, ProviderRef};
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct JobsFile {
    #[serde(default)]
    jobs: Vec<JobDefinition>,
}

/// One entry of the jobs file. Every field defaults so that missing
/// required values are reported by the registry with the job's position.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobDefinition {
    job_id: String,
    project: String,
    display_name: String,
    environment: String,
    provider: ProviderDefinition,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderDefinition {
    kind: String,
    #[serde(rename = "ref")]
    reference: ProviderRef,
}

impl From<JobDefinition> for Job {
    fn from(def: JobDefinition) -> Self {
        Self {
            job_id: def.job_id,
            project: def.project,
            display_name: def.display_name,
            environment: def.environment,
            provider: JobProvider {
                kind: def.provider.kind,
                reference: def.provider.reference,
            },
        }
    }
}

/// Parse a jobs document and build the registry.
pub fn parse_jobs(yaml: &str) -> Result<JobRegistry, CliError> {
    let file: JobsFile = serde_yaml::from_str(yaml)
        .map_err(|e| CliError::Config(format!("parse jobs config: {e}")))?;
    let jobs = file.jobs.into_iter().map(Job::from).collect();
    JobRegistry::new(jobs).map_err(|e| CliError::Config(e.to_string()))
}

/// Read and validate the jobs file at `path`.
pub fn load_jobs(path: &Path) -> Result<JobRegistry, CliError> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("read jobs config file {}: {e}", path.display()))
    })?;
    let registry = parse_jobs(&yaml)?;
    tracing::info!(path = %path.display(), count = registry.len(), "Loaded jobs");
    Ok(registry)
}
