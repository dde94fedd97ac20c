//! Core storage for admin-defined data tables.
//!
//! Provides the schema registry, schema-validated row storage,
//! chart aggregation, row/column totals, and snapshot persistence.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod persistence;
pub mod row;
pub mod schema;

pub use catalog::Catalog;
pub use error::TableError;
