//! Run (single job execution) types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-agnostic run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Errored,
    Unknown,
}

impl RunStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Queued,
        Self::Running,
        Self::Succeeded,
        Self::Failed,
        Self::Canceled,
        Self::Errored,
        Self::Unknown,
    ];

    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Errored => "errored",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the run can no longer change state.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Canceled | Self::Errored
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single execution of a job, as last reported by the provider.
///
/// The gateway never stores runs; every `Run` is freshly mapped from a
/// provider response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Opaque public identifier (for Concourse: `team:pipeline:job:build_id`).
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Caller-supplied trigger input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerParams {
    /// Free-form parameters forwarded to the provider.
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Accepted and logged; repeated keys still trigger distinct runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_lowercase() {
        for status in RunStatus::ALL {
            let value = serde_json::to_value(status).unwrap();
            assert_eq!(value, json!(status.as_str()));
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::Unknown.is_terminal());
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_run_omits_unset_optional_fields() {
        let run = Run {
            run_id: "main:p:j:42".to_string(),
            job_id: None,
            status: RunStatus::Queued,
            created_at: DateTime::from_timestamp(1_000, 0).unwrap(),
            started_at: None,
            finished_at: None,
        };

        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["run_id"], "main:p:j:42");
        assert_eq!(value["status"], "queued");
        assert_eq!(value["created_at"], "1970-01-01T00:16:40Z");
        assert!(value.get("job_id").is_none());
        assert!(value.get("started_at").is_none());
        assert!(value.get("finished_at").is_none());
    }

    #[test]
    fn test_trigger_params_accept_empty_body() {
        let params: TriggerParams = serde_json::from_value(json!({})).unwrap();
        assert!(params.parameters.is_empty());
        assert!(params.idempotency_key.is_none());
    }
}
