//! Concourse API wire types.
//!
//! Only the fields the adapter reads are declared; everything else in the
//! payloads is ignored.

use serde::Deserialize;

/// Response of the `sky` issuer token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// A build. Timestamps are Unix seconds; `0` or absent means unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildDto {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub pipeline_name: Option<String>,
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub create_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamDto {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDto {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobDto {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub next_build: Option<BuildDto>,
    #[serde(default)]
    pub finished_build: Option<BuildDto>,
}

/// Error payload shape used by the Concourse API.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
