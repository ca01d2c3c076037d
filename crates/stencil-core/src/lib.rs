//! stencil-core
//!
//! Pure domain types for the template service: the `Template` model, document
//! field names, the API version guard and id generation.
//! No storage or transport dependency.

pub mod api;
pub mod error;
pub mod id;
pub mod models;
pub mod schema;
