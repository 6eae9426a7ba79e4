//! gRPC Xray service implementation
//! Driving adapter that exposes the engine restart operation

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{error, info};

use crate::domain::services::EngineLifecycleCoordinator;
use crate::domain::{ClientId, DomainError};
use crate::proto::xray_server::Xray;
use crate::proto::XrayInfo;

/// gRPC service implementation
pub struct XrayGrpcService {
    coordinator: Arc<EngineLifecycleCoordinator>,
}

impl XrayGrpcService {
    pub fn new(coordinator: Arc<EngineLifecycleCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[tonic::async_trait]
impl Xray for XrayGrpcService {
    async fn restart_xray(
        &self,
        request: Request<XrayInfo>,
    ) -> Result<Response<XrayInfo>, Status> {
        let req = request.into_inner();

        info!(client_id = %req.uuid, "gRPC RestartXray request received");

        let client_id: ClientId = req
            .uuid
            .parse()
            .map_err(|e: DomainError| Status::invalid_argument(e.to_string()))?;

        // Spawned so a dropped request cannot abort a restart that is
        // already committed to stopping/starting the engine.
        let coordinator = self.coordinator.clone();
        let restart = tokio::spawn(async move { coordinator.restart(client_id).await });

        restart
            .await
            .map_err(|e| Status::internal(format!("Restart task failed: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "Engine restart failed");
                // Identity format was already vetted by the ClientId
                // parse above; anything surfacing here is internal.
                Status::internal(format!("Failed to restart engine: {}", e))
            })?;

        info!(client_id = %req.uuid, "Engine restarted via gRPC");

        Ok(Response::new(XrayInfo { uuid: req.uuid }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{EngineHandle, LivenessStore, ProxyEngine, RefreshOutcome};
    use crate::domain::services::EngineConfig;
    use crate::domain::{EngineStatus, Result};
    use async_trait::async_trait;

    struct NullStore;

    #[async_trait]
    impl LivenessStore for NullStore {
        async fn refresh_expiration(&self) -> Result<RefreshOutcome> {
            Ok(RefreshOutcome::Refreshed)
        }

        async fn upsert(&self, _status: &EngineStatus) -> Result<()> {
            Ok(())
        }
    }

    struct NullEngine;

    #[derive(Debug)]
    struct NullHandle;

    #[async_trait]
    impl EngineHandle for NullHandle {
        async fn stop(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl ProxyEngine for NullEngine {
        async fn start(&self, _config: &EngineConfig) -> Result<Box<dyn EngineHandle>> {
            Ok(Box::new(NullHandle))
        }
    }

    fn service() -> XrayGrpcService {
        let coordinator = Arc::new(EngineLifecycleCoordinator::new(
            EngineConfig::parse(
                r#"{"inbounds": [{"settings": {"clients": [{"id": "x"}]}}]}"#,
            )
            .unwrap(),
            Arc::new(NullEngine),
            Arc::new(NullStore),
            chrono_tz::UTC,
            "addr:1".to_string(),
        ));
        XrayGrpcService::new(coordinator)
    }

    #[tokio::test]
    async fn test_valid_uuid_is_echoed_back() {
        let svc = service();
        let response = svc
            .restart_xray(Request::new(XrayInfo {
                uuid: "a1b2c3d4-e5f6-4a1b-8c2d-0123456789ab".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(
            response.into_inner().uuid,
            "a1b2c3d4-e5f6-4a1b-8c2d-0123456789ab"
        );
    }

    #[tokio::test]
    async fn test_malformed_uuid_is_invalid_argument() {
        let svc = service();
        let status = svc
            .restart_xray(Request::new(XrayInfo {
                uuid: "not-a-uuid".to_string(),
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
