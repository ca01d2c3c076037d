use std::net::SocketAddr;

use thiserror::Error;
use tonic::Status;

use stencil_core::error::ApiVersionError;
use stencil_storage::{Namespace, StoreError};

/// Failure of a repository operation, one variant per failing step.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to insert into {namespace}: {source}")]
    Insert {
        namespace: Namespace,
        #[source]
        source: StoreError,
    },

    #[error("failed to find document: {0}")]
    Find(#[source] StoreError),

    #[error("failed to find document: no document with id '{id}'")]
    NotFound { id: String },

    #[error("failed to decode document: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to update document: {0}")]
    Update(#[source] StoreError),

    #[error("failed to delete document: {0}")]
    Delete(#[source] StoreError),

    #[error("failed to find documents in {namespace}: {source}")]
    OpenCursor {
        namespace: Namespace,
        #[source]
        source: StoreError,
    },

    #[error("failed reading documents: {0}")]
    ReadCursor(#[source] StoreError),
}

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    VersionUnsupported(#[from] ApiVersionError),

    #[error(transparent)]
    Backend(#[from] RepositoryError),
}

impl From<ServiceError> for Status {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::VersionUnsupported(e) => {
                tracing::warn!(error = %e, "rejected request");
                Status::unimplemented(e.to_string())
            }
            ServiceError::Backend(e) => {
                tracing::error!(error = %e, "backend failure");
                Status::unknown(e.to_string())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}
