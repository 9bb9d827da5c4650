//! Read-only discovery DTOs.
//!
//! These are core-owned shapes returned by providers that support
//! discovery. Status strings are passed through in the backend's own
//! vocabulary; discovery is a browsing aid, not part of the run contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub id: u64,
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineJobInfo {
    pub id: u64,
    pub name: String,
    pub pipeline: String,
    pub team: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_build: Option<BuildInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_build: Option<BuildInfo>,
}

/// A build as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub id: u64,
    pub name: String,
    /// Backend-native status string.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// A build plus its execution plan.
///
/// The plan is diagnostic: it is `None` when the backend could not
/// provide it, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDetails {
    pub build: BuildInfo,
    pub plan: Option<serde_json::Value>,
}
