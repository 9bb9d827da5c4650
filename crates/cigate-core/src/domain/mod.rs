//! Domain types shared by every adapter.

mod discovery;
mod health;
mod job;
mod run;

pub use discovery::{BuildDetails, BuildInfo, PipelineInfo, PipelineJobInfo, TeamInfo};
pub use health::{ComponentHealth, HealthChecks, HealthReport, HealthStatus};
pub use job::{Job, JobProvider, ProviderRef};
pub use run::{Run, RunStatus, TriggerParams};
