//! gRPC driving adapter

mod service;

pub use service::XrayGrpcService;
