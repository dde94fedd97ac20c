//! Tick-based runtime that serializes catalog requests from the API layer.

use desa_tables_core::TableError;
use tokio::sync::oneshot;

mod api_handlers;
mod api_request;
mod runtime;

pub use api_handlers::ApiHandlers;
pub use api_request::ApiRequest;
pub use runtime::Runtime;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, TableError>;

/// Response sender for API requests
pub type ResponseSender = oneshot::Sender<Result<serde_json::Value>>;
