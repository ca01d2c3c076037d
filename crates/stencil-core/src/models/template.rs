use serde::{Deserialize, Serialize};

/// A persisted template.
///
/// `id` and `created` are fixed at creation; only `items` and `updated`
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub items: Vec<String>,
    pub created: jiff::Timestamp,
    pub updated: jiff::Timestamp,
}

impl Template {
    /// Build a fresh record whose `created` and `updated` are the same instant.
    pub fn new(id: impl Into<String>, items: Vec<String>, now: jiff::Timestamp) -> Self {
        Self {
            id: id.into(),
            items,
            created: now,
            updated: now,
        }
    }
}
