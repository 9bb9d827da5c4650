//! Runnable job definitions.
//!
//! Jobs are loaded once at startup and never change afterwards. The
//! `provider.ref` map is opaque to the core: only the matching provider
//! adapter knows how to decode it into a typed job reference.

use serde::{Deserialize, Serialize};

/// Provider-specific key-value configuration attached to a job.
pub type ProviderRef = serde_json::Map<String, serde_json::Value>;

/// A runnable CI job exposed through the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Caller-chosen unique identifier used in public URLs.
    pub job_id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub environment: String,
    pub provider: JobProvider,
}

/// Which provider runs a job, and the provider's reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProvider {
    /// Provider kind, e.g. `concourse`.
    pub kind: String,
    /// Opaque provider reference (for Concourse: `team`, `pipeline`, `job`).
    #[serde(rename = "ref", default)]
    pub reference: ProviderRef,
}

impl Job {
    /// Create a job with empty descriptive fields.
    pub fn new(job_id: impl Into<String>, kind: impl Into<String>, reference: ProviderRef) -> Self {
        Self {
            job_id: job_id.into(),
            project: String::new(),
            display_name: String::new(),
            environment: String::new(),
            provider: JobProvider {
                kind: kind.into(),
                reference,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_wire_shape_uses_ref_key() {
        let job: Job = serde_json::from_value(json!({
            "job_id": "build-api",
            "project": "api",
            "display_name": "Build API",
            "environment": "dev",
            "provider": {
                "kind": "concourse",
                "ref": {"team": "main", "pipeline": "api", "job": "build"}
            }
        }))
        .unwrap();

        assert_eq!(job.provider.kind, "concourse");
        assert_eq!(job.provider.reference["pipeline"], "api");

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["provider"]["ref"]["team"], "main");
        assert!(value["provider"].get("reference").is_none());
    }

    #[test]
    fn test_descriptive_fields_default_to_empty() {
        let job: Job = serde_json::from_value(json!({
            "job_id": "deploy",
            "provider": {"kind": "concourse"}
        }))
        .unwrap();

        assert!(job.project.is_empty());
        assert!(job.display_name.is_empty());
        assert!(job.provider.reference.is_empty());
    }
}
