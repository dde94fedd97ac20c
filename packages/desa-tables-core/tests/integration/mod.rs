//! Integration tests for the table catalog.
//!
//! - Lifecycle: schema definition, row entry, totals, charts, deletion
//! - Persistence: flush, restart, and recovery through the public API

pub mod helpers;
pub mod lifecycle_tests;
pub mod persistence_tests;
