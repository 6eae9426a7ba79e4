//! Heartbeat loop
//!
//! Periodic driver that keeps the liveness record fresh for the
//! lifetime of the process. The interval is half the record TTL so at
//! least one refresh lands before expiration even if one tick is
//! delayed. Runs until the cancellation token is triggered.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::services::EngineLifecycleCoordinator;
use crate::domain::Result;

/// Publish the initial status record, then refresh it on a fixed
/// cadence until cancellation.
///
/// The initial publish failing is returned as an error and treated as
/// fatal by the caller; per-tick refresh errors are logged and the
/// loop continues, since a transient store outage must not take the
/// engine down with it.
pub async fn run(
    coordinator: Arc<EngineLifecycleCoordinator>,
    interval: Duration,
    cancellation_token: CancellationToken,
) -> Result<()> {
    coordinator.publish_initial_status().await?;
    info!(interval_secs = interval.as_secs(), "Keeping engine status started");

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Keeping engine status canceled");
                return Ok(());
            }
            _ = tokio::time::sleep(interval) => {
                if let Err(e) = coordinator.refresh_or_recreate().await {
                    error!(error = %e, "Error while refreshing engine status TTL");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{EngineHandle, LivenessStore, ProxyEngine, RefreshOutcome};
    use crate::domain::services::EngineConfig;
    use crate::domain::EngineStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        refreshes: AtomicUsize,
        upserts: AtomicUsize,
        fail_refresh: bool,
    }

    impl CountingStore {
        fn new(fail_refresh: bool) -> Arc<Self> {
            Arc::new(Self {
                refreshes: AtomicUsize::new(0),
                upserts: AtomicUsize::new(0),
                fail_refresh,
            })
        }
    }

    #[async_trait]
    impl LivenessStore for CountingStore {
        async fn refresh_expiration(&self) -> Result<RefreshOutcome> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                return Err(crate::domain::DomainError::Store(
                    "store unreachable".to_string(),
                ));
            }
            Ok(RefreshOutcome::Refreshed)
        }

        async fn upsert(&self, _status: &EngineStatus) -> Result<()> {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NeverStartedEngine;

    #[async_trait]
    impl ProxyEngine for NeverStartedEngine {
        async fn start(&self, _config: &EngineConfig) -> Result<Box<dyn EngineHandle>> {
            unreachable!("heartbeat never starts the engine")
        }
    }

    fn coordinator(store: Arc<CountingStore>) -> Arc<EngineLifecycleCoordinator> {
        Arc::new(EngineLifecycleCoordinator::new(
            EngineConfig::parse(
                r#"{"inbounds": [{"settings": {"clients": [{"id": "x"}]}}]}"#,
            )
            .unwrap(),
            Arc::new(NeverStartedEngine),
            store,
            chrono_tz::UTC,
            "addr:1".to_string(),
        ))
    }

    #[tokio::test]
    async fn test_publishes_once_then_refreshes_until_cancelled() {
        let store = CountingStore::new(false);
        let coordinator = coordinator(store.clone());

        let token = CancellationToken::new();
        let task = tokio::spawn(run(
            coordinator,
            Duration::from_millis(10),
            token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(80)).await;
        token.cancel();
        task.await.unwrap().unwrap();

        assert_eq!(store.upserts.load(Ordering::SeqCst), 1);
        assert!(store.refreshes.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_refresh_errors_do_not_terminate_the_loop() {
        let store = CountingStore::new(true);
        let coordinator = coordinator(store.clone());

        let token = CancellationToken::new();
        let task = tokio::spawn(run(
            coordinator,
            Duration::from_millis(10),
            token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(80)).await;
        // Every tick failed so far, yet the loop kept ticking and
        // only cancellation ends it.
        assert!(!task.is_finished());
        assert!(store.refreshes.load(Ordering::SeqCst) >= 2);

        token.cancel();
        task.await.unwrap().unwrap();
    }
}
