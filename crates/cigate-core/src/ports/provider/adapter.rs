//! CI provider port trait.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::discovery::DiscoveryCapable;
use super::error::ProviderResult;
use crate::domain::{ProviderRef, Run, TriggerParams};
use crate::ports::EventSink;

/// Port trait for a single backing CI engine.
///
/// The implementation for Concourse lives in `cigate-concourse`.
///
/// # Design
///
/// - Job and run references are typed per provider (associated types);
///   the service never inspects them beyond `Display` for the public id
/// - Every failure is returned as `ProviderError`; the service performs the
///   only translation step
/// - Discovery is an optional capability exposed through [`Self::discovery`]
#[async_trait]
pub trait CiProvider: Send + Sync {
    /// Decoded form of a job's `provider.ref` map.
    type JobRef: fmt::Debug + Send + Sync;

    /// Structured run reference; `Display` yields the public run id.
    type RunRef: fmt::Debug + fmt::Display + Send + Sync;

    /// Provider kind as written in job definitions, e.g. `concourse`.
    fn kind(&self) -> &'static str;

    /// Decode a job's provider reference.
    fn job_ref(&self, reference: &ProviderRef) -> ProviderResult<Self::JobRef>;

    /// Parse a public run identifier.
    fn parse_run_ref(&self, run_id: &str) -> ProviderResult<Self::RunRef>;

    /// Start a new run of `job`.
    async fn trigger(
        &self,
        job: &Self::JobRef,
        params: &TriggerParams,
    ) -> ProviderResult<Self::RunRef>;

    /// Fetch the current state of a run.
    async fn get_run(&self, run: &Self::RunRef) -> ProviderResult<Run>;

    /// Relay the run's event stream into `sink` until the backend closes it
    /// or `cancel` fires.
    async fn stream_events(
        &self,
        run: &Self::RunRef,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> ProviderResult<()>;

    /// Abort a run.
    async fn cancel(&self, run: &Self::RunRef) -> ProviderResult<()>;

    /// Cheap connectivity probe used by the health report.
    async fn health_check(&self) -> ProviderResult<()>;

    /// Discovery operations, if this provider supports them.
    fn discovery(&self) -> Option<&dyn DiscoveryCapable> {
        None
    }
}
