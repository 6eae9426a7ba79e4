//! Driving adapters - how the outside world reaches the coordinator

pub mod grpc;
