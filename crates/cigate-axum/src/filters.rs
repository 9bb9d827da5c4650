//! Query-string filters for the discovery listings.

use cigate_core::{PipelineInfo, PipelineJobInfo};
use serde::Deserialize;

/// `?team&search&paused&archived` on the pipeline listing.
#[derive(Debug, Default, Deserialize)]
pub struct PipelineQuery {
    pub team: Option<String>,
    pub search: Option<String>,
    pub paused: Option<String>,
    pub archived: Option<String>,
}

/// `?team&search&paused` on the job listing.
#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
    pub team: Option<String>,
    pub search: Option<String>,
    pub paused: Option<String>,
}

/// `true`/`1` and `false`/`0`; anything else disables the filter.
pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value? {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Case-insensitive substring matcher; an empty needle matches everything.
struct NameMatch(Option<String>);

impl NameMatch {
    fn new(search: Option<&str>) -> Self {
        Self(search.filter(|s| !s.is_empty()).map(str::to_lowercase))
    }

    fn matches(&self, name: &str) -> bool {
        self.0
            .as_deref()
            .is_none_or(|needle| name.to_lowercase().contains(needle))
    }
}

fn flag_matches(filter: Option<bool>, value: bool) -> bool {
    filter.is_none_or(|wanted| wanted == value)
}

pub fn filter_pipelines(pipelines: Vec<PipelineInfo>, query: &PipelineQuery) -> Vec<PipelineInfo> {
    let name = NameMatch::new(query.search.as_deref());
    let paused = parse_flag(query.paused.as_deref());
    let archived = parse_flag(query.archived.as_deref());

    pipelines
        .into_iter()
        .filter(|p| name.matches(&p.name))
        .filter(|p| flag_matches(paused, p.paused))
        .filter(|p| flag_matches(archived, p.archived))
        .collect()
}

pub fn filter_jobs(jobs: Vec<PipelineJobInfo>, query: &JobQuery) -> Vec<PipelineJobInfo> {
    let name = NameMatch::new(query.search.as_deref());
    let paused = parse_flag(query.paused.as_deref());

    jobs.into_iter()
        .filter(|j| name.matches(&j.name))
        .filter(|j| flag_matches(paused, j.paused))
        .collect()
}
