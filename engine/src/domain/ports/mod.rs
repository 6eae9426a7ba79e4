pub mod engine;
pub mod liveness_store;

pub use engine::{EngineHandle, ProxyEngine};
pub use liveness_store::{LivenessStore, RefreshOutcome};
