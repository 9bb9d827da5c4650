#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod registry;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{
    BuildDetails, BuildInfo, ComponentHealth, HealthChecks, HealthReport, HealthStatus, Job,
    JobProvider, PipelineInfo, PipelineJobInfo, ProviderRef, Run, RunStatus, TeamInfo,
    TriggerParams,
};
pub use ports::{
    CiProvider, CoreError, DiscoveryCapable, EventSink, GatewayPort, ProviderError,
    ProviderResult, WriterSink,
};
pub use registry::{JobRegistry, RegistryError};
pub use services::{GatewayService, SERVICE_NAME};
