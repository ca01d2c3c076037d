use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::document::{DeleteResult, Document, Filter, InsertOneResult, Namespace, Update, UpdateResult};
use crate::error::StoreError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Entry point of a backend: resolves `database.collection` to a handle.
pub trait DocumentStore: Send + Sync {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn Collection>;
}

/// Single-document operations plus a cursor-based scan over one collection.
///
/// Every single-document operation is atomic on its own; nothing spans
/// documents.
pub trait Collection: Send + Sync {
    fn namespace(&self) -> &Namespace;

    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult, StoreError>>;

    /// First document matching `filter`, or `None`.
    fn find_one(&self, filter: Filter) -> BoxFuture<'_, Result<Option<Document>, StoreError>>;

    /// Apply `update` to the first document matching `filter`.
    fn update_one(
        &self,
        filter: Filter,
        update: Update,
    ) -> BoxFuture<'_, Result<UpdateResult, StoreError>>;

    /// Remove the first document matching `filter`.
    fn delete_one(&self, filter: Filter) -> BoxFuture<'_, Result<DeleteResult, StoreError>>;

    /// Open a cursor over every document matching `filter`, in backend order.
    fn find(&self, filter: Filter) -> BoxFuture<'_, Result<Box<dyn Cursor>, StoreError>>;
}

/// Server-side iterator over a `find` result.
pub trait Cursor: Send {
    /// Next document, `None` once exhausted. An error ends the iteration.
    fn next(&mut self) -> BoxFuture<'_, Option<Result<Document, StoreError>>>;

    /// Release the cursor. Calling `next` afterwards yields `CursorClosed`.
    fn close(&mut self) -> BoxFuture<'_, ()>;
}
