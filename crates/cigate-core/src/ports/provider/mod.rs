//! CI provider port definitions.
//!
//! This module defines the provider contract, the optional discovery
//! capability and the provider error taxonomy. The Concourse implementation
//! lives in `cigate-concourse`.

mod adapter;
mod discovery;
mod error;

pub use adapter::CiProvider;
pub use discovery::DiscoveryCapable;
pub use error::{ProviderError, ProviderResult};

// Discovery is handed out as `&dyn DiscoveryCapable`.
const _: fn(&dyn DiscoveryCapable) = |_| {};
