//! gRPC module for admin-service.

mod admin_service;

pub use admin_service::AdminServiceImpl;

/// Generated protobuf code.
pub mod proto {
    tonic::include_proto!("micros.admin.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("admin_descriptor");
}
