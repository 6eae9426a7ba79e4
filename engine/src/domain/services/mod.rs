pub mod config_templater;
pub mod coordinator;
pub mod heartbeat;

pub use config_templater::{EngineConfig, TemplateSubstitutions};
pub use coordinator::EngineLifecycleCoordinator;
