//! Typed filters and updates over the template collection.
//!
//! The repository never spells a field name itself; everything goes through
//! [`TemplateField`].

use serde_json::Value;
use stencil_core::schema::field;
use stencil_storage::{Filter, Update};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    Id,
    Items,
    Created,
    Updated,
}

impl TemplateField {
    pub const fn name(self) -> &'static str {
        match self {
            TemplateField::Id => field::ID,
            TemplateField::Items => field::ITEMS,
            TemplateField::Created => field::CREATED,
            TemplateField::Updated => field::UPDATED,
        }
    }
}

pub struct TemplateQuery;

impl TemplateQuery {
    pub fn all() -> Filter {
        Filter::all()
    }

    pub fn by_id(id: &str) -> Filter {
        Filter::all().where_eq(TemplateField::Id.name(), id)
    }
}

/// The mutable part of a template. `id` and `created` have no place here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChanges {
    pub items: Vec<String>,
    pub updated: jiff::Timestamp,
}

impl TemplateChanges {
    pub fn new(items: Vec<String>, updated: jiff::Timestamp) -> Self {
        Self { items, updated }
    }

    pub fn into_update(self) -> Update {
        // Same RFC 3339 text jiff's serde impl writes, so documents stay uniform.
        Update::new()
            .set(TemplateField::Items.name(), Value::from(self.items))
            .set(TemplateField::Updated.name(), self.updated.to_string())
    }
}
