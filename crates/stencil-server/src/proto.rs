//! Generated protobuf types and tonic stubs.

pub mod v1 {
    tonic::include_proto!("stencil.v1");
}
