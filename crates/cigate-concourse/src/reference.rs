//! Concourse job and run references.
//!
//! A run is exposed to API clients as `team:pipeline:job:build_id`. Concourse
//! names cannot contain `:`, and the colon is safe unescaped in a URL path
//! segment, so the encoding is a plain join.

use std::fmt;
use std::str::FromStr;

use cigate_core::ProviderRef;

use crate::error::ConcourseError;

const DELIMITER: char = ':';

/// A Concourse job decoded from a job's `provider.ref` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcourseJobRef {
    pub team: String,
    pub pipeline: String,
    pub job: String,
}

impl ConcourseJobRef {
    /// Decode `{team, pipeline, job}` string entries.
    pub fn from_provider_ref(reference: &ProviderRef) -> Result<Self, ConcourseError> {
        Ok(Self {
            team: required_name(reference, "team")?,
            pipeline: required_name(reference, "pipeline")?,
            job: required_name(reference, "job")?,
        })
    }
}

fn required_name(reference: &ProviderRef, key: &str) -> Result<String, ConcourseError> {
    let invalid = |message: String| ConcourseError::InvalidJobRef { message };

    let value = reference
        .get(key)
        .ok_or_else(|| invalid(format!("missing '{key}'")))?;
    let name = value
        .as_str()
        .ok_or_else(|| invalid(format!("'{key}' must be a string")))?;

    if name.is_empty() {
        return Err(invalid(format!("'{key}' must not be empty")));
    }
    if name.contains(DELIMITER) {
        return Err(invalid(format!("'{key}' must not contain '{DELIMITER}'")));
    }
    if crate::paths::is_dot_segment(name) {
        return Err(invalid(format!("'{key}' must not be '{name}'")));
    }
    Ok(name.to_string())
}

/// One Concourse build, addressable by its public run id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcourseRunRef {
    pub team: String,
    pub pipeline: String,
    pub job: String,
    pub build_id: u64,
}

impl ConcourseRunRef {
    pub fn new(job: &ConcourseJobRef, build_id: u64) -> Self {
        Self {
            team: job.team.clone(),
            pipeline: job.pipeline.clone(),
            job: job.job.clone(),
            build_id,
        }
    }
}

impl fmt::Display for ConcourseRunRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.team, self.pipeline, self.job, self.build_id
        )
    }
}

impl FromStr for ConcourseRunRef {
    type Err = ConcourseError;

    fn from_str(run_id: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: String| ConcourseError::MalformedReference {
            reference: run_id.to_string(),
            reason,
        };

        let parts: Vec<&str> = run_id.split(DELIMITER).collect();
        let [team, pipeline, job, build_id] = parts.as_slice() else {
            return Err(malformed(format!(
                "expected 4 '{DELIMITER}'-separated segments, found {}",
                parts.len()
            )));
        };

        if [team, pipeline, job, build_id].iter().any(|s| s.is_empty()) {
            return Err(malformed("empty segment".to_string()));
        }

        Ok(Self {
            team: (*team).to_string(),
            pipeline: (*pipeline).to_string(),
            job: (*job).to_string(),
            build_id: parse_build_id(build_id).map_err(malformed)?,
        })
    }
}

/// Canonical decimal only, so that `parse` and `Display` stay inverse.
fn parse_build_id(segment: &str) -> Result<u64, String> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("build id '{segment}' is not a non-negative integer"));
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return Err(format!("build id '{segment}' has leading zeros"));
    }
    segment
        .parse()
        .map_err(|_| format!("build id '{segment}' is out of range"))
}
