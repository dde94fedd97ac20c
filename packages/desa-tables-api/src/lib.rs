//! REST API server for admin-defined data tables.
//!
//! Provides HTTP endpoints for schema definitions, row entry, totals,
//! and chart aggregation, and routes them to the runtime.

pub mod handlers;
pub mod router;
pub mod server;
