//! Static in-memory job registry.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::Job;

/// Errors raised while building the registry from job definitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("job at index {index}: job_id is required")]
    MissingJobId { index: usize },

    #[error("job '{job_id}': provider.kind is required")]
    MissingProviderKind { job_id: String },

    #[error("duplicate job_id '{job_id}'")]
    DuplicateJob { job_id: String },
}

/// Immutable mapping `job_id -> Job`, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: BTreeMap<String, Job>,
}

impl JobRegistry {
    /// Validate and index job definitions.
    pub fn new(jobs: Vec<Job>) -> Result<Self, RegistryError> {
        let mut indexed = BTreeMap::new();

        for (index, job) in jobs.into_iter().enumerate() {
            if job.job_id.trim().is_empty() {
                return Err(RegistryError::MissingJobId { index });
            }
            if job.provider.kind.trim().is_empty() {
                return Err(RegistryError::MissingProviderKind { job_id: job.job_id });
            }
            if indexed.contains_key(&job.job_id) {
                return Err(RegistryError::DuplicateJob { job_id: job.job_id });
            }
            indexed.insert(job.job_id.clone(), job);
        }

        Ok(Self { jobs: indexed })
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    /// Jobs in `job_id` order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
