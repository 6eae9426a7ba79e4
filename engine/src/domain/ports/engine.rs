//! ProxyEngine port
//! Interface for starting and stopping the managed proxy engine

use async_trait::async_trait;

use crate::domain::services::EngineConfig;
use crate::domain::Result;

/// A running engine instance.
///
/// Owned exclusively by the lifecycle coordinator; at most one handle
/// is live at any time. Dropping a handle without calling `stop` is a
/// defect in the caller, not something implementations must tolerate.
#[async_trait]
pub trait EngineHandle: Send + Sync + std::fmt::Debug {
    /// Stop the engine and release its resources. Bounded, not
    /// interruptible mid-call.
    async fn stop(&mut self) -> Result<()>;
}

/// Port for creating engine instances from a working configuration.
#[async_trait]
pub trait ProxyEngine: Send + Sync {
    /// Start a new engine instance. On failure no handle exists and
    /// nothing needs to be cleaned up by the caller.
    async fn start(&self, config: &EngineConfig) -> Result<Box<dyn EngineHandle>>;
}
