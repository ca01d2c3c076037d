//! Document layout of persisted templates.

/// Database holding the template collection.
pub const DATABASE: &str = "template";

/// Collection holding one document per template.
pub const COLLECTION: &str = "template";

/// Field names of a template document.
pub mod field {
    pub const ID: &str = "id";
    pub const ITEMS: &str = "items";
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
}
