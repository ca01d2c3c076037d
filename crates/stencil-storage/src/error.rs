use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: a document with {field} '{key}' already exists")]
    DuplicateKey { field: String, key: String },

    #[error("document has no string '{field}' field")]
    MissingKey { field: String },

    #[error("invalid key '{key}': keys may not be empty or contain '/'")]
    InvalidKey { key: String },

    #[error("field '{field}' is the collection key and cannot be updated")]
    ImmutableKey { field: String },

    #[error("document {key} was modified concurrently")]
    PreconditionFailed { key: String },

    #[error("stored object {key} is not a JSON document: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cursor is closed")]
    CursorClosed,

    #[error("S3 GetObject error: {0}")]
    GetObject(String),

    #[error("S3 PutObject error: {0}")]
    PutObject(String),

    #[error("S3 DeleteObject error: {0}")]
    DeleteObject(String),

    #[error("S3 ListObjects error: {0}")]
    ListObjects(String),
}
