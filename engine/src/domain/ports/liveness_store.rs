//! LivenessStore port
//! Interface to the external TTL-backed record store

use async_trait::async_trait;

use crate::domain::{EngineStatus, Result};

/// Outcome of a TTL refresh attempt.
///
/// A missing record is a recovery signal, not a failure: the caller
/// reacts by republishing from memory instead of retrying blindly, so
/// it gets its own variant rather than riding the error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Record exists, expiration reset to the configured TTL.
    Refreshed,
    /// Record is absent (expired or evicted); no side effects.
    NotFound,
}

/// Port for the liveness record store, scoped to one engine instance.
#[async_trait]
pub trait LivenessStore: Send + Sync {
    /// Check the record exists and reset its expiration.
    async fn refresh_expiration(&self) -> Result<RefreshOutcome>;

    /// Write all status fields, append a change event describing the
    /// write, and reset the record's expiration.
    async fn upsert(&self, status: &EngineStatus) -> Result<()>;
}
