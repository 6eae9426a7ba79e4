//! Redis implementation of the LivenessStore port
//!
//! One status record per engine instance, stored as a hash under
//! `xrayEngines:<engine id>` with a rolling TTL. Every write also
//! appends a change event to `xray_engines_keyevent_stream` for
//! consumers that tail the log rather than poll the record.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

use crate::domain::ports::{LivenessStore, RefreshOutcome};
use crate::domain::{DomainError, EngineStatus, Result};

const HASH_KEY_PREFIX: &str = "xrayEngines:";
const KEYEVENT_STREAM: &str = "xray_engines_keyevent_stream";

fn hash_key(engine_id: &str) -> String {
    format!("{}{}", HASH_KEY_PREFIX, engine_id)
}

/// Liveness store client scoped to one engine instance.
pub struct RedisLivenessStore {
    connection: MultiplexedConnection,
    hash_key: String,
    ttl: Duration,
}

impl RedisLivenessStore {
    /// Connect to the store. The connection is multiplexed and shared
    /// by the heartbeat task and restart handlers.
    pub async fn connect(addr: &str, password: &str, engine_id: &str, ttl: Duration) -> Result<Self> {
        let url = if password.is_empty() {
            format!("redis://{}/", addr)
        } else {
            format!("redis://:{}@{}/", password, addr)
        };
        let client =
            redis::Client::open(url).map_err(|e| DomainError::Store(e.to_string()))?;
        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;

        Ok(Self {
            connection,
            hash_key: hash_key(engine_id),
            ttl,
        })
    }

    fn ttl_secs(&self) -> i64 {
        self.ttl.as_secs() as i64
    }
}

#[async_trait]
impl LivenessStore for RedisLivenessStore {
    async fn refresh_expiration(&self) -> Result<RefreshOutcome> {
        let mut conn = self.connection.clone();

        let exists: bool = conn
            .exists(&self.hash_key)
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        if !exists {
            return Ok(RefreshOutcome::NotFound);
        }

        let _: bool = conn
            .expire(&self.hash_key, self.ttl_secs())
            .await
            .map_err(|e| DomainError::Store(format!("expiration not set: {}", e)))?;

        Ok(RefreshOutcome::Refreshed)
    }

    async fn upsert(&self, status: &EngineStatus) -> Result<()> {
        let mut conn = self.connection.clone();
        let fields = status.wire_fields();
        let payload = status.wire_payload();

        // HSET + XADD run as one MULTI/EXEC transaction. The EXPIRE
        // is a separate step; if we die between the two the record
        // merely expires later than intended, its content is intact.
        redis::pipe()
            .atomic()
            .hset_multiple(&self.hash_key, &fields)
            .ignore()
            .xadd(
                KEYEVENT_STREAM,
                "*",
                &[
                    ("event", "hset"),
                    ("key", self.hash_key.as_str()),
                    ("payload", payload.as_str()),
                ],
            )
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| DomainError::Store(format!("status not set: {}", e)))?;

        let _: bool = conn
            .expire(&self.hash_key, self.ttl_secs())
            .await
            .map_err(|e| DomainError::Store(format!("expiration not set: {}", e)))?;

        debug!(key = %self.hash_key, running = status.running, "Engine status upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_key_derivation() {
        assert_eq!(hash_key("engine-7"), "xrayEngines:engine-7");
    }
}
