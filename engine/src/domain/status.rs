//! Engine status record
//!
//! The status record is a projection of the coordinator's in-memory
//! engine state, mirrored into the liveness store so other processes
//! can discover this instance. The store is never the source of truth;
//! recovery always rebuilds the record from memory.

use crate::domain::ClientId;

/// Wire field names for the cache record (fixed external contract).
pub const FIELD_RUNNING: &str = "running";
pub const FIELD_CREATED: &str = "created";
pub const FIELD_ADDR: &str = "addr";
pub const FIELD_IDENTITY: &str = "identity";

/// Last-known state of the managed engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    /// RFC3339 timestamp (nanosecond precision, configured timezone)
    /// of the last status transition.
    pub created: String,
    /// Whether an engine handle is currently live.
    pub running: bool,
    /// Client identity served by the running engine, if any.
    pub client_id: Option<ClientId>,
    /// Externally reachable address of this instance.
    pub external_addr: String,
}

impl EngineStatus {
    /// Initial status for a freshly booted process: no engine yet.
    pub fn offline(external_addr: String) -> Self {
        Self {
            created: String::new(),
            running: false,
            client_id: None,
            external_addr,
        }
    }

    /// Flatten into the cache record's field map. The identity field
    /// is present only when an engine has been started at least once.
    pub fn wire_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            (FIELD_RUNNING.to_string(), self.running.to_string()),
            (FIELD_CREATED.to_string(), self.created.clone()),
            (FIELD_ADDR.to_string(), self.external_addr.clone()),
        ];
        if let Some(ref id) = self.client_id {
            fields.push((FIELD_IDENTITY.to_string(), id.to_string()));
        }
        fields
    }

    /// JSON snapshot of the written fields, carried on the change
    /// event stream for consumers that tail instead of poll.
    pub fn wire_payload(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .wire_fields()
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}
