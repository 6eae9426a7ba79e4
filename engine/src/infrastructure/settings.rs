//! Daemon configuration from environment variables
//!
//! All settings are validated together at startup; a missing or
//! malformed variable is fatal before the daemon starts serving.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::domain::{DomainError, Result};

/// Default engine binary resolved from PATH when XRAY_BIN is unset.
const DEFAULT_XRAY_BIN: &str = "xray";

/// Daemon configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Stable instance identity within the liveness store, assigned
    /// once at deploy time and never regenerated.
    pub engine_id: String,

    /// Port the gRPC control surface listens on.
    pub grpc_port: u16,

    /// Externally reachable address published in the status record.
    pub external_addr: String,

    /// Liveness store connection.
    pub redis_addr: String,
    pub redis_pass: String,

    /// TTL applied to the status record on every write/refresh.
    pub engine_ttl: Duration,

    /// Timezone applied to status timestamps.
    pub timezone: Tz,

    /// Engine config template (`<XRAY_CONFIG_DIR>/config.json`).
    pub config_template: PathBuf,

    /// Directory where the working engine config is materialized.
    pub config_dir: PathBuf,

    /// Directory receiving the engine's access/error logs.
    pub log_dir: PathBuf,

    /// TLS material, shared by the gRPC server and the engine config.
    pub ssl_certfile: String,
    pub ssl_keyfile: String,

    /// Fallback host substituted into the engine config template.
    pub xray_fallback: String,

    /// Engine binary to launch.
    pub xray_bin: PathBuf,
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .map_err(|_| DomainError::InvalidConfiguration(format!("{} not specified", name)))
}

impl Settings {
    /// Load and validate all settings from the environment.
    pub fn from_env() -> Result<Self> {
        let engine_id = required("ENGINE_ID")?;

        let grpc_port = required("GRPC_PORT")?
            .parse::<u16>()
            .map_err(|e| DomainError::InvalidConfiguration(format!("GRPC_PORT: {}", e)))?;
        let external_addr = required("EXTERNAL_ADDR")?;

        let redis_addr = required("REDIS_ADDR")?;
        let redis_pass = required("REDIS_PASS")?;
        let ttl_secs = required("ENGINE_TTL")?
            .parse::<u64>()
            .map_err(|e| DomainError::InvalidConfiguration(format!("ENGINE_TTL: {}", e)))?;
        if ttl_secs == 0 {
            return Err(DomainError::InvalidConfiguration(
                "ENGINE_TTL must be positive".to_string(),
            ));
        }

        let timezone = required("TIMEZONE")?
            .parse::<Tz>()
            .map_err(|e| DomainError::InvalidConfiguration(format!("TIMEZONE: {}", e)))?;

        let config_dir = PathBuf::from(required("XRAY_CONFIG_DIR")?);
        let log_dir = PathBuf::from(required("XRAY_LOG_DIR")?);

        Ok(Self {
            engine_id,
            grpc_port,
            external_addr,
            redis_addr,
            redis_pass,
            engine_ttl: Duration::from_secs(ttl_secs),
            timezone,
            config_template: config_dir.join("config.json"),
            config_dir,
            log_dir,
            ssl_certfile: required("SSL_CERTFILE")?,
            ssl_keyfile: required("SSL_KEYFILE")?,
            xray_fallback: env::var("XRAY_FALLBACK").unwrap_or_default(),
            xray_bin: PathBuf::from(
                env::var("XRAY_BIN").unwrap_or_else(|_| DEFAULT_XRAY_BIN.to_string()),
            ),
        })
    }

    /// Interval between heartbeat ticks: half the record TTL, so at
    /// least one refresh lands before expiration even if one tick is
    /// delayed.
    pub fn heartbeat_interval(&self) -> Duration {
        self.engine_ttl / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_is_named_in_error() {
        let err = required("XRAY_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(err.to_string().contains("XRAY_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_heartbeat_interval_is_half_ttl() {
        let settings = Settings {
            engine_id: "i".to_string(),
            grpc_port: 50051,
            external_addr: "a".to_string(),
            redis_addr: "r".to_string(),
            redis_pass: "p".to_string(),
            engine_ttl: Duration::from_secs(30),
            timezone: chrono_tz::UTC,
            config_template: PathBuf::from("/etc/xray/config.json"),
            config_dir: PathBuf::from("/etc/xray"),
            log_dir: PathBuf::from("/var/log/xray"),
            ssl_certfile: "c".to_string(),
            ssl_keyfile: "k".to_string(),
            xray_fallback: String::new(),
            xray_bin: PathBuf::from("xray"),
        };
        assert_eq!(settings.heartbeat_interval(), Duration::from_secs(15));
    }
}
