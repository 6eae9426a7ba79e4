//! Engine lifecycle coordinator
//!
//! Owns the running engine handle and the last-known status, and
//! serializes every state-touching operation behind a single async
//! mutex. The heartbeat task and each inbound restart request run
//! concurrently against the same coordinator; the lock is held across
//! each operation's full critical section, engine stop/start included,
//! so a heartbeat tick can never observe a half-finished swap.
//!
//! The cache record is a projection of engine state, never the source
//! of truth: every recovery path rebuilds the record from memory.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{EngineHandle, LivenessStore, ProxyEngine, RefreshOutcome};
use crate::domain::services::EngineConfig;
use crate::domain::{ClientId, EngineStatus, Result};

struct CoordinatorState {
    config: EngineConfig,
    handle: Option<Box<dyn EngineHandle>>,
    status: EngineStatus,
}

/// Coordinates start/stop/restart of the managed engine and mirrors
/// its state into the liveness store.
pub struct EngineLifecycleCoordinator {
    engine: Arc<dyn ProxyEngine>,
    store: Arc<dyn LivenessStore>,
    timezone: Tz,
    state: Mutex<CoordinatorState>,
}

impl EngineLifecycleCoordinator {
    pub fn new(
        config: EngineConfig,
        engine: Arc<dyn ProxyEngine>,
        store: Arc<dyn LivenessStore>,
        timezone: Tz,
        external_addr: String,
    ) -> Self {
        Self {
            engine,
            store,
            timezone,
            state: Mutex::new(CoordinatorState {
                config,
                handle: None,
                status: EngineStatus::offline(external_addr),
            }),
        }
    }

    fn now(&self) -> String {
        Utc::now()
            .with_timezone(&self.timezone)
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Publish the initial "not running" record. Called exactly once,
    /// before the heartbeat loop's first tick; failure is fatal since
    /// without a record external observers cannot discover us at all.
    pub async fn publish_initial_status(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.status.created = self.now();
        self.store.upsert(&state.status).await?;
        info!(created = %state.status.created, "Initial engine status published");
        Ok(())
    }

    /// Refresh the record's expiration; if the record has expired or
    /// been evicted, republish the current in-memory status verbatim
    /// so the last-known running/identity state survives the eviction.
    pub async fn refresh_or_recreate(&self) -> Result<()> {
        let state = self.state.lock().await;
        match self.store.refresh_expiration().await? {
            RefreshOutcome::Refreshed => Ok(()),
            RefreshOutcome::NotFound => {
                warn!("Engine status record expired, republishing from memory");
                self.store.upsert(&state.status).await
            }
        }
    }

    /// Swap the running engine for a fresh one bound to `client_id`.
    ///
    /// The identifier is already format-validated by construction of
    /// [`ClientId`]. Any existing engine is stopped before the new one
    /// starts; on start failure the coordinator is left Stopped and
    /// the stale cache record is corrected by the next successful
    /// restart or left to expire. A publish failure after a successful
    /// start is surfaced but does not roll the engine back.
    pub async fn restart(&self, client_id: ClientId) -> Result<()> {
        let mut state = self.state.lock().await;

        if let Some(mut handle) = state.handle.take() {
            debug!("Stopping previous engine instance");
            state.status.running = false;
            if let Err(e) = handle.stop().await {
                // The old handle is gone either way; a stop failure
                // must not block binding the new identity.
                warn!(error = %e, "Failed to stop previous engine cleanly");
            }
        }

        state.config.bind_client_id(&client_id)?;

        let handle = self.engine.start(&state.config).await?;

        state.handle = Some(handle);
        state.status.running = true;
        state.status.client_id = Some(client_id.clone());
        state.status.created = self.now();

        info!(client_id = %client_id, "Engine restarted");

        self.store.upsert(&state.status).await
    }

    /// Snapshot of the last-known status.
    pub async fn status(&self) -> EngineStatus {
        self.state.lock().await.status.clone()
    }

    /// Best-effort cleanup on process exit: no exit path may leave a
    /// handle without an attempt to stop it.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(mut handle) = state.handle.take() {
            state.status.running = false;
            if let Err(e) = handle.stop().await {
                warn!(error = %e, "Failed to stop engine during shutdown");
            } else {
                info!("Engine stopped during shutdown");
            }
        }
    }
}
