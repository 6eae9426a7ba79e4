//! Domain-level errors
//! These represent business rule violations and failures of the
//! engine/store collaborators, surfaced as explicit results.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    // Startup configuration errors (fatal, no retry)
    #[error("Failed to read engine config template: {0}")]
    ConfigLoad(#[source] std::io::Error),

    #[error("Engine config template invalid: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // Validation errors
    #[error("Specified client id '{0}' is not a canonical UUIDv4")]
    InvalidIdentity(String),

    // Engine lifecycle errors
    #[error("Failed to start engine: {0}")]
    EngineStart(String),

    #[error("Failed to stop engine: {0}")]
    EngineStop(String),

    // Liveness store errors (transient, callers decide retry policy)
    #[error("Liveness store operation failed: {0}")]
    Store(String),

    // Defects, never user-facing error conditions
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
