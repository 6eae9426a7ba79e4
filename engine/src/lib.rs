pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod transport;

pub mod proto {
    tonic::include_proto!("xray");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("proto_descriptor");
}
