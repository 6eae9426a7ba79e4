//! Xray process engine adapter
//!
//! Runs the proxy engine as a child process: the working
//! configuration is materialized to disk and the xray binary is
//! launched against it. Stopping the engine kills and reaps the
//! child. `kill_on_drop` backstops abnormal exits so a dropped handle
//! can never orphan a proxy process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::domain::ports::{EngineHandle, ProxyEngine};
use crate::domain::services::EngineConfig;
use crate::domain::{DomainError, Result};

/// How long to watch a freshly spawned engine for an immediate exit
/// (bad config, missing binary permissions) before declaring success.
const STARTUP_PROBE: Duration = Duration::from_millis(300);

const ACTIVE_CONFIG_FILE: &str = "active-config.json";

/// Engine adapter launching the xray binary as a managed child.
pub struct XrayProcessEngine {
    binary: PathBuf,
    config_dir: PathBuf,
}

impl XrayProcessEngine {
    pub fn new(binary: PathBuf, config_dir: PathBuf) -> Self {
        Self { binary, config_dir }
    }
}

#[async_trait]
impl ProxyEngine for XrayProcessEngine {
    async fn start(&self, config: &EngineConfig) -> Result<Box<dyn EngineHandle>> {
        let config_path = self.config_dir.join(ACTIVE_CONFIG_FILE);
        tokio::fs::write(&config_path, config.to_bytes()?)
            .await
            .map_err(|e| {
                DomainError::EngineStart(format!(
                    "failed to write working config {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        let mut child = Command::new(&self.binary)
            .arg("run")
            .arg("-config")
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::EngineStart(format!("failed to spawn {}: {}", self.binary.display(), e))
            })?;

        // A config the engine rejects makes it exit within
        // milliseconds; catch that here instead of reporting a
        // "running" engine that is already dead.
        tokio::time::sleep(STARTUP_PROBE).await;
        match child.try_wait() {
            Ok(Some(exit)) => {
                return Err(DomainError::EngineStart(format!(
                    "engine exited immediately: {}",
                    exit
                )))
            }
            Ok(None) => {}
            Err(e) => {
                return Err(DomainError::EngineStart(format!(
                    "failed to probe engine: {}",
                    e
                )))
            }
        }

        let pid = child.id();
        info!(pid = ?pid, config = %config_path.display(), "Engine process started");

        Ok(Box::new(XrayProcessHandle { child }))
    }
}

#[derive(Debug)]
struct XrayProcessHandle {
    child: Child,
}

#[async_trait]
impl EngineHandle for XrayProcessHandle {
    async fn stop(&mut self) -> Result<()> {
        let pid = self.child.id();
        debug!(pid = ?pid, "Stopping engine process");

        if let Err(e) = self.child.start_kill() {
            // Already exited on its own; reap below either way.
            warn!(pid = ?pid, error = %e, "Engine process kill failed");
        }

        match self.child.wait().await {
            Ok(exit) => {
                info!(pid = ?pid, exit = %exit, "Engine process stopped");
                Ok(())
            }
            Err(e) => Err(DomainError::EngineStop(e.to_string())),
        }
    }
}
