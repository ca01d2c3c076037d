use std::sync::Arc;

use jiff::Timestamp;
use stencil_core::id::IdGenerator;
use stencil_core::models::template::Template;
use stencil_core::schema;
use stencil_storage::{Collection, Cursor, Document, DocumentStore, Namespace, StoreError};

use crate::error::RepositoryError;
use crate::query::{TemplateChanges, TemplateQuery};

/// Create/Read/Update/Delete/List over the `template.template` collection.
///
/// Holds no state besides the collection handle: every call is a single
/// store round-trip and nothing is retried.
pub struct TemplateRepository {
    collection: Arc<dyn Collection>,
    ids: IdGenerator,
}

impl TemplateRepository {
    pub fn new(store: &dyn DocumentStore) -> Self {
        Self::with_id_generator(store, IdGenerator::random())
    }

    pub fn with_id_generator(store: &dyn DocumentStore, ids: IdGenerator) -> Self {
        Self {
            collection: store.collection(schema::DATABASE, schema::COLLECTION),
            ids,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        self.collection.namespace()
    }

    /// Store a new template with a fresh id. `created` and `updated` are the
    /// same instant.
    pub async fn create(&self, items: Vec<String>) -> Result<Template, RepositoryError> {
        let template = Template::new(self.ids.next_id(), items, Timestamp::now());

        let insert_error = |source| RepositoryError::Insert {
            namespace: self.namespace().clone(),
            source,
        };
        let document = encode(&template).map_err(insert_error)?;
        self.collection
            .insert_one(document)
            .await
            .map_err(insert_error)?;

        tracing::debug!(id = %template.id, items = template.items.len(), "template created");
        Ok(template)
    }

    pub async fn read(&self, id: &str) -> Result<Template, RepositoryError> {
        let document = self
            .collection
            .find_one(TemplateQuery::by_id(id))
            .await
            .map_err(RepositoryError::Find)?
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;

        decode(document)
    }

    /// Replace the items of template `id` and refresh `updated`.
    ///
    /// Returns the number of modified templates; an unknown id is `Ok(0)`.
    pub async fn update(&self, id: &str, items: Vec<String>) -> Result<u64, RepositoryError> {
        let changes = TemplateChanges::new(items, Timestamp::now());
        let result = self
            .collection
            .update_one(TemplateQuery::by_id(id), changes.into_update())
            .await
            .map_err(RepositoryError::Update)?;

        tracing::debug!(
            id,
            matched = result.matched_count,
            modified = result.modified_count,
            "template update applied"
        );
        Ok(result.modified_count)
    }

    /// Returns the number of removed templates; an unknown id is `Ok(0)`.
    pub async fn delete(&self, id: &str) -> Result<u64, RepositoryError> {
        let result = self
            .collection
            .delete_one(TemplateQuery::by_id(id))
            .await
            .map_err(RepositoryError::Delete)?;

        tracing::debug!(id, deleted = result.deleted_count, "template delete applied");
        Ok(result.deleted_count)
    }

    /// Every template, in store order. Any failure discards what was read so far.
    pub async fn list(&self) -> Result<Vec<Template>, RepositoryError> {
        let mut cursor = self
            .collection
            .find(TemplateQuery::all())
            .await
            .map_err(|source| RepositoryError::OpenCursor {
                namespace: self.namespace().clone(),
                source,
            })?;

        let templates = drain(cursor.as_mut()).await;
        cursor.close().await;
        templates
    }
}

async fn drain(cursor: &mut dyn Cursor) -> Result<Vec<Template>, RepositoryError> {
    let mut templates = Vec::new();
    while let Some(next) = cursor.next().await {
        let document = next.map_err(RepositoryError::ReadCursor)?;
        templates.push(decode(document)?);
    }
    Ok(templates)
}

fn encode(template: &Template) -> Result<Document, StoreError> {
    let value = serde_json::to_value(template)?;
    Ok(serde_json::from_value(value)?)
}

fn decode(document: Document) -> Result<Template, RepositoryError> {
    serde_json::from_value(serde_json::Value::Object(document)).map_err(RepositoryError::Decode)
}
