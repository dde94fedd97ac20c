//! HTTP endpoint implementations for schemas, rows, and derived views.

pub mod request_utils;
pub mod response;
pub mod row_handlers;
pub mod schema_handlers;

pub use response::{error_response, success_response, ApiError, ApiResponse, ErrorResponse};
pub use row_handlers::{delete_row, get_row, insert_row, list_rows, update_row};
pub use schema_handlers::{
    aggregate, chart_series, column_totals, create_schema, delete_schema, get_schema,
    get_schema_by_storage_name, list_schemas, update_schema,
};
