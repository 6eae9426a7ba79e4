pub mod error;
pub mod identity;
pub mod ports;
pub mod services;
pub mod status;

pub use error::{DomainError, Result};
pub use identity::ClientId;
pub use status::EngineStatus;
