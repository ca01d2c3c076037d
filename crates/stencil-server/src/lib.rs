//! stencil-server library root.
//!
//! Exposes the repository, gRPC service and server runtime so the binary and
//! the integration tests share one implementation.

pub mod config;
pub mod convert;
pub mod error;
pub mod middleware;
pub mod proto;
pub mod query;
pub mod repository;
pub mod server;
pub mod service;
pub mod shutdown;
pub mod telemetry;
