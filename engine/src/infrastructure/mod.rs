//! Infrastructure layer - driven adapters
//! Concrete implementations of the domain ports plus daemon settings.

pub mod redis_store;
pub mod settings;
pub mod xray_process;

pub use redis_store::RedisLivenessStore;
pub use settings::Settings;
pub use xray_process::XrayProcessEngine;
