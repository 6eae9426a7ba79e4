//! xray engine daemon
//!
//! Wires the lifecycle coordinator to its collaborators and runs the
//! two long-lived tasks: the gRPC control surface and the heartbeat
//! loop. Startup failures (settings, template, store connection,
//! initial status publish) are fatal; after that only shutdown
//! signals or a dead transport end the process.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xray_engine::domain::services::{
    heartbeat, EngineConfig, EngineLifecycleCoordinator, TemplateSubstitutions,
};
use xray_engine::infrastructure::{RedisLivenessStore, Settings, XrayProcessEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let substitutions = TemplateSubstitutions {
        fallback_host: settings.xray_fallback.clone(),
        log_dir: settings.log_dir.clone(),
        cert_path: settings.ssl_certfile.clone(),
        key_path: settings.ssl_keyfile.clone(),
    };
    let config = EngineConfig::load(&settings.config_template, &substitutions)?;

    let store = RedisLivenessStore::connect(
        &settings.redis_addr,
        &settings.redis_pass,
        &settings.engine_id,
        settings.engine_ttl,
    )
    .await?;

    let engine = XrayProcessEngine::new(settings.xray_bin.clone(), settings.config_dir.clone());

    let coordinator = Arc::new(EngineLifecycleCoordinator::new(
        config,
        Arc::new(engine),
        Arc::new(store),
        settings.timezone,
        settings.external_addr.clone(),
    ));

    let cancellation = CancellationToken::new();
    let mut heartbeat_task = tokio::spawn(heartbeat::run(
        coordinator.clone(),
        settings.heartbeat_interval(),
        cancellation.clone(),
    ));

    let serve = xray_engine::transport::serve(&settings, coordinator.clone(), shutdown_signal());
    tokio::pin!(serve);

    let result: Result<(), Box<dyn std::error::Error>> = tokio::select! {
        res = &mut serve => {
            info!("gRPC server stopped, canceling heartbeat");
            cancellation.cancel();
            let _ = (&mut heartbeat_task).await;
            res
        }
        res = &mut heartbeat_task => {
            // The heartbeat only ends early when the initial status
            // publish fails; without that record external observers
            // cannot discover this instance at all.
            match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!(error = %e, "Failed to publish initial engine status");
                    Err(e.into())
                }
                Err(e) => Err(e.into()),
            }
        }
    };

    // No exit path leaves the engine handle without a stop attempt.
    coordinator.shutdown().await;

    result
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
