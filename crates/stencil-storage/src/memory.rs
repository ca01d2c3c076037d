use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use crate::collection::{BoxFuture, Collection, Cursor, DocumentStore};
use crate::document::{DeleteResult, Document, Filter, InsertOneResult, Namespace, Update, UpdateResult};
use crate::error::StoreError;
use crate::DEFAULT_KEY_FIELD;

/// Process-local store. Documents keep insertion order.
#[derive(Debug)]
pub struct MemoryStore {
    key_field: String,
    collections: Mutex<HashMap<Namespace, Arc<MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_key_field(DEFAULT_KEY_FIELD)
    }

    /// Use `key_field` as the unique, immutable document key.
    pub fn with_key_field(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            collections: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn Collection> {
        let namespace = Namespace::new(database, collection);
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let handle = collections.entry(namespace.clone()).or_insert_with(|| {
            tracing::debug!(%namespace, "creating in-memory collection");
            Arc::new(MemoryCollection {
                namespace,
                key_field: self.key_field.clone(),
                documents: AsyncMutex::new(Vec::new()),
            })
        });

        handle.clone()
    }
}

#[derive(Debug)]
pub struct MemoryCollection {
    namespace: Namespace,
    key_field: String,
    documents: AsyncMutex<Vec<Document>>,
}

impl MemoryCollection {
    fn key_of<'d>(&self, document: &'d Document) -> Result<&'d str, StoreError> {
        document
            .get(&self.key_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::MissingKey {
                field: self.key_field.clone(),
            })
    }
}

impl Collection for MemoryCollection {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult, StoreError>> {
        Box::pin(async move {
            let key = self.key_of(&document)?.to_string();
            let mut documents = self.documents.lock().await;

            let taken = documents
                .iter()
                .any(|d| d.get(&self.key_field).and_then(|v| v.as_str()) == Some(key.as_str()));
            if taken {
                return Err(StoreError::DuplicateKey {
                    field: self.key_field.clone(),
                    key,
                });
            }

            documents.push(document);
            Ok(InsertOneResult {
                inserted_id: Some(key),
            })
        })
    }

    fn find_one(&self, filter: Filter) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        Box::pin(async move {
            let documents = self.documents.lock().await;
            Ok(documents.iter().find(|d| filter.matches(d)).cloned())
        })
    }

    fn update_one(
        &self,
        filter: Filter,
        update: Update,
    ) -> BoxFuture<'_, Result<UpdateResult, StoreError>> {
        Box::pin(async move {
            if update.touches(&self.key_field) {
                return Err(StoreError::ImmutableKey {
                    field: self.key_field.clone(),
                });
            }

            let mut documents = self.documents.lock().await;
            let Some(document) = documents.iter_mut().find(|d| filter.matches(d)) else {
                return Ok(UpdateResult::default());
            };

            let modified = update.apply(document);
            Ok(UpdateResult {
                matched_count: 1,
                modified_count: u64::from(modified),
            })
        })
    }

    fn delete_one(&self, filter: Filter) -> BoxFuture<'_, Result<DeleteResult, StoreError>> {
        Box::pin(async move {
            let mut documents = self.documents.lock().await;
            let deleted_count = match documents.iter().position(|d| filter.matches(d)) {
                Some(index) => {
                    documents.remove(index);
                    1
                }
                None => 0,
            };
            Ok(DeleteResult { deleted_count })
        })
    }

    fn find(&self, filter: Filter) -> BoxFuture<'_, Result<Box<dyn Cursor>, StoreError>> {
        Box::pin(async move {
            let documents = self.documents.lock().await;
            let pending: VecDeque<Document> = documents
                .iter()
                .filter(|d| filter.matches(d))
                .cloned()
                .collect();

            Ok(Box::new(MemoryCursor {
                pending,
                closed: false,
            }) as Box<dyn Cursor>)
        })
    }
}

/// Snapshot of the matching documents taken when the cursor was opened.
struct MemoryCursor {
    pending: VecDeque<Document>,
    closed: bool,
}

impl Cursor for MemoryCursor {
    fn next(&mut self) -> BoxFuture<'_, Option<Result<Document, StoreError>>> {
        Box::pin(async move {
            if self.closed {
                return Some(Err(StoreError::CursorClosed));
            }
            self.pending.pop_front().map(Ok)
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closed = true;
            self.pending.clear();
        })
    }
}
