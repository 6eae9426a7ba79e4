//! Engine configuration templating
//!
//! Loads the static engine configuration template from disk once at
//! startup and substitutes deployment-specific placeholders. The
//! result is held as a structured JSON document with the client id as
//! a named field, so rebinding the identity never depends on the byte
//! layout of the serialized blob. Serialization happens only at the
//! point the configuration is handed to the engine.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::domain::{ClientId, DomainError, Result};

/// JSON path of the client identity slot inside the engine config.
const CLIENT_ID_POINTER: &str = "/inbounds/0/settings/clients/0/id";

/// Deployment-specific values spliced into the raw template text.
#[derive(Debug, Clone)]
pub struct TemplateSubstitutions {
    /// Host substituted for the `example.com` fallback placeholder.
    pub fallback_host: String,
    /// Directory receiving the engine's access and error logs.
    pub log_dir: PathBuf,
    /// TLS certificate file substituted for `example.crt`.
    pub cert_path: String,
    /// TLS key file substituted for `example.key`.
    pub key_path: String,
}

/// Working engine configuration: the substituted template plus the
/// mutable client identity slot.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    document: Value,
}

impl EngineConfig {
    /// Load the template file and apply the placeholder substitutions.
    ///
    /// Runs once at startup; any failure here is fatal to the process.
    pub fn load(template_path: &Path, subs: &TemplateSubstitutions) -> Result<Self> {
        let raw = std::fs::read_to_string(template_path).map_err(DomainError::ConfigLoad)?;
        debug!(path = %template_path.display(), "Loaded engine config template");
        Self::from_template(&raw, subs)
    }

    /// Apply substitutions to raw template text and parse the result.
    /// Each placeholder is replaced at most once, in fixed order.
    pub fn from_template(raw: &str, subs: &TemplateSubstitutions) -> Result<Self> {
        let access_log = subs.log_dir.join("access.log");
        let error_log = subs.log_dir.join("error.log");

        let text = raw
            .replacen("example.com", &subs.fallback_host, 1)
            .replacen("a_example.log", &access_log.to_string_lossy(), 1)
            .replacen("e_example.log", &error_log.to_string_lossy(), 1)
            .replacen("example.crt", &subs.cert_path, 1)
            .replacen("example.key", &subs.key_path, 1);

        Self::parse(&text)
    }

    /// Parse substituted configuration text into a working config.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| DomainError::ConfigParse(e.to_string()))?;

        // The identity slot must exist up front; discovering it is
        // missing during a restart would be an invariant violation.
        if document.pointer(CLIENT_ID_POINTER).and_then(Value::as_str).is_none() {
            return Err(DomainError::ConfigParse(format!(
                "client id slot '{}' missing or not a string",
                CLIENT_ID_POINTER
            )));
        }

        Ok(Self { document })
    }

    /// Rebind the client identity slot to a new id.
    ///
    /// The slot was verified at load time, so a missing slot here is a
    /// defect, never a recoverable input error.
    pub fn bind_client_id(&mut self, id: &ClientId) -> Result<()> {
        match self.document.pointer_mut(CLIENT_ID_POINTER) {
            Some(slot) => {
                *slot = Value::String(id.to_string());
                Ok(())
            }
            None => Err(DomainError::InvariantViolation(format!(
                "client id slot '{}' vanished from engine config",
                CLIENT_ID_POINTER
            ))),
        }
    }

    /// Serialize for handing to the engine-start capability.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.document)
            .map_err(|e| DomainError::InvariantViolation(format!("config serialization: {}", e)))
    }
}
