//! S3-backed document store.
//!
//! Layout: `<database>/<collection>/<key>.json` in a single bucket, where
//! `<key>` is the string value of the collection's key field. Inserts and
//! updates are conditional puts: inserts require the object to be absent,
//! updates require the ETag read just before the write.
//!
//! Deletes are not conditional. Two concurrent deletes of the same document
//! can both observe it and both report `deleted_count = 1`.

pub mod client;
pub mod objects;

use std::collections::VecDeque;
use std::sync::Arc;

use aws_sdk_s3::Client;

use crate::collection::{BoxFuture, Collection, Cursor, DocumentStore};
use crate::document::{DeleteResult, Document, Filter, InsertOneResult, Namespace, Update, UpdateResult};
use crate::error::StoreError;
use crate::DEFAULT_KEY_FIELD;

const OBJECT_SUFFIX: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Options {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    key_field: String,
}

impl S3Store {
    /// Load AWS configuration and build a store over `options.bucket`.
    pub async fn connect(options: &S3Options) -> Self {
        let client = client::build_client(options).await;
        Self::new(client, options.bucket.clone())
    }

    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key_field: DEFAULT_KEY_FIELD.to_string(),
        }
    }

    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }
}

impl DocumentStore for S3Store {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn Collection> {
        let namespace = Namespace::new(database, collection);
        Arc::new(S3Collection {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            prefix: collection_prefix(&namespace),
            key_field: self.key_field.clone(),
            namespace,
        })
    }
}

/// Prefix under which every document of `namespace` lives.
pub fn collection_prefix(namespace: &Namespace) -> String {
    format!("{}/{}/", namespace.database, namespace.collection)
}

/// Object key of the document whose key field is `key`.
pub fn document_path(prefix: &str, key: &str) -> Result<String, StoreError> {
    if key.is_empty() || key.contains('/') {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(format!("{prefix}{key}{OBJECT_SUFFIX}"))
}

/// Whether a listed object key names a document directly under `prefix`.
pub fn is_document_key(prefix: &str, object_key: &str) -> bool {
    object_key
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(OBJECT_SUFFIX))
        .is_some_and(|key| !key.is_empty() && !key.contains('/'))
}

fn decode(object_key: &str, body: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(body).map_err(|source| StoreError::Decode {
        key: object_key.to_string(),
        source,
    })
}

/// A document together with where it lives and the ETag it was read at.
struct Located {
    object_key: String,
    document: Document,
    etag: Option<String>,
}

pub struct S3Collection {
    client: Client,
    bucket: String,
    namespace: Namespace,
    prefix: String,
    key_field: String,
}

impl S3Collection {
    async fn load(&self, object_key: String) -> Result<Option<Located>, StoreError> {
        let Some(object) = objects::get_object(&self.client, &self.bucket, &object_key).await?
        else {
            return Ok(None);
        };

        let document = decode(&object_key, &object.body)?;
        Ok(Some(Located {
            object_key,
            document,
            etag: object.etag,
        }))
    }

    /// First document matching `filter`. An equality on the key field is a
    /// direct GET; anything else scans the collection.
    async fn locate(&self, filter: &Filter) -> Result<Option<Located>, StoreError> {
        if let Some(value) = filter.equality(&self.key_field) {
            let Some(key) = value.as_str() else {
                return Ok(None);
            };
            let Ok(object_key) = document_path(&self.prefix, key) else {
                return Ok(None);
            };

            let located = self.load(object_key).await?;
            return Ok(located.filter(|l| filter.matches(&l.document)));
        }

        let mut cursor = self.open_cursor(filter.clone()).await?;
        let found = cursor.advance().await;
        cursor.release();
        found
    }

    async fn open_cursor(&self, filter: Filter) -> Result<S3Cursor, StoreError> {
        let mut cursor = S3Cursor {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            filter,
            pending: VecDeque::new(),
            next_token: None,
            exhausted: false,
            closed: false,
        };
        cursor.fetch_page().await?;
        Ok(cursor)
    }
}

impl Collection for S3Collection {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult, StoreError>> {
        Box::pin(async move {
            let key = document
                .get(&self.key_field)
                .and_then(|v| v.as_str())
                .ok_or_else(|| StoreError::MissingKey {
                    field: self.key_field.clone(),
                })?
                .to_string();
            let object_key = document_path(&self.prefix, &key)?;
            let body = serde_json::to_vec(&document)?;

            objects::put_object_if_absent(&self.client, &self.bucket, &object_key, body)
                .await
                .map_err(|e| match e {
                    StoreError::PreconditionFailed { .. } => StoreError::DuplicateKey {
                        field: self.key_field.clone(),
                        key: key.clone(),
                    },
                    other => other,
                })?;

            tracing::debug!(bucket = %self.bucket, key = %object_key, "document inserted");
            Ok(InsertOneResult {
                inserted_id: Some(key),
            })
        })
    }

    fn find_one(&self, filter: Filter) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        Box::pin(async move { Ok(self.locate(&filter).await?.map(|l| l.document)) })
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

            let Some(mut located) = self.locate(&filter).await? else {
                return Ok(UpdateResult::default());
            };

            if !update.apply(&mut located.document) {
                return Ok(UpdateResult {
                    matched_count: 1,
                    modified_count: 0,
                });
            }

            let body = serde_json::to_vec(&located.document)?;
            // "*" still requires the object to exist if S3 returned no ETag.
            let expected = located.etag.as_deref().unwrap_or("*");
            objects::put_object_if_match(
                &self.client,
                &self.bucket,
                &located.object_key,
                body,
                expected,
            )
            .await?;

            tracing::debug!(bucket = %self.bucket, key = %located.object_key, "document updated");
            Ok(UpdateResult {
                matched_count: 1,
                modified_count: 1,
            })
        })
    }

    fn delete_one(&self, filter: Filter) -> BoxFuture<'_, Result<DeleteResult, StoreError>> {
        Box::pin(async move {
            let Some(located) = self.locate(&filter).await? else {
                return Ok(DeleteResult::default());
            };

            objects::delete_object(&self.client, &self.bucket, &located.object_key).await?;

            tracing::debug!(bucket = %self.bucket, key = %located.object_key, "document deleted");
            Ok(DeleteResult { deleted_count: 1 })
        })
    }

    fn find(&self, filter: Filter) -> BoxFuture<'_, Result<Box<dyn Cursor>, StoreError>> {
        Box::pin(async move {
            let cursor = self.open_cursor(filter).await?;
            Ok(Box::new(cursor) as Box<dyn Cursor>)
        })
    }
}

/// Walks a prefix listing page by page, fetching one object per step.
pub struct S3Cursor {
    client: Client,
    bucket: String,
    prefix: String,
    filter: Filter,
    pending: VecDeque<String>,
    next_token: Option<String>,
    exhausted: bool,
    closed: bool,
}

impl S3Cursor {
    async fn fetch_page(&mut self) -> Result<(), StoreError> {
        let page = objects::list_page(
            &self.client,
            &self.bucket,
            &self.prefix,
            self.next_token.as_deref(),
        )
        .await?;

        let prefix = &self.prefix;
        self.pending
            .extend(page.keys.into_iter().filter(|k| is_document_key(prefix, k)));
        self.exhausted = page.next_token.is_none();
        self.next_token = page.next_token;
        Ok(())
    }

    async fn advance(&mut self) -> Result<Option<Located>, StoreError> {
        loop {
            if let Some(object_key) = self.pending.pop_front() {
                // Deleted between listing and fetch.
                let Some(object) =
                    objects::get_object(&self.client, &self.bucket, &object_key).await?
                else {
                    continue;
                };

                let document = decode(&object_key, &object.body)?;
                if self.filter.matches(&document) {
                    return Ok(Some(Located {
                        object_key,
                        document,
                        etag: object.etag,
                    }));
                }
                continue;
            }

            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    fn release(&mut self) {
        self.closed = true;
        self.exhausted = true;
        self.pending.clear();
        self.next_token = None;
    }
}

impl Cursor for S3Cursor {
    fn next(&mut self) -> BoxFuture<'_, Option<Result<Document, StoreError>>> {
        Box::pin(async move {
            if self.closed {
                return Some(Err(StoreError::CursorClosed));
            }

            match self.advance().await {
                Ok(found) => found.map(|l| Ok(l.document)),
                Err(e) => {
                    // An error ends the iteration; later calls report exhaustion.
                    self.exhausted = true;
                    self.pending.clear();
                    Some(Err(e))
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.release() })
    }
}
