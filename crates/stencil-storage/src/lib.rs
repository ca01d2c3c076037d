//! stencil-storage
//!
//! Document-store abstraction: databases hold collections, collections hold
//! JSON documents addressed by filters. Two backends are provided, an
//! in-memory one and one that keeps each document as a JSON object in S3.

pub mod collection;
pub mod document;
pub mod error;
pub mod memory;
pub mod s3;

pub use collection::{BoxFuture, Collection, Cursor, DocumentStore};
pub use document::{DeleteResult, Document, Filter, InsertOneResult, Namespace, Update, UpdateResult};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use s3::{S3Options, S3Store};

/// Field that uniquely identifies a document unless a backend is told otherwise.
pub const DEFAULT_KEY_FIELD: &str = "id";
