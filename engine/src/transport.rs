//! gRPC server bootstrap
//!
//! Assembles the tonic server: TLS identity from the configured
//! cert/key pair, the xray control service, plus health and
//! reflection so fleet tooling can probe and introspect the daemon.

use std::error::Error;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::{Identity, Server, ServerTlsConfig};
use tracing::info;

use crate::adapters::grpc::XrayGrpcService;
use crate::domain::services::EngineLifecycleCoordinator;
use crate::infrastructure::Settings;
use crate::proto::xray_server::XrayServer;

/// Health-check service name registered for this daemon.
const HEALTH_SERVICE_NAME: &str = "xray";

/// Serve the control surface until `shutdown` resolves. In-flight
/// requests (including one committed restart) are drained before the
/// server returns.
pub async fn serve<F>(
    settings: &Settings,
    coordinator: Arc<EngineLifecycleCoordinator>,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = ()>,
{
    let cert = tokio::fs::read(&settings.ssl_certfile).await?;
    let key = tokio::fs::read(&settings.ssl_keyfile).await?;
    let identity = Identity::from_pem(cert, key);

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_service_status(HEALTH_SERVICE_NAME, tonic_health::ServingStatus::Serving)
        .await;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(crate::proto::FILE_DESCRIPTOR_SET)
        .build()?;

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.grpc_port));
    info!(addr = %addr, "xray engine daemon listening");

    Server::builder()
        .tls_config(ServerTlsConfig::new().identity(identity))?
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(XrayServer::new(XrayGrpcService::new(coordinator)))
        .serve_with_shutdown(addr, shutdown)
        .await?;

    Ok(())
}
