//! Table schema, column descriptors, and chart definitions.

mod chart;
mod column;
#[allow(clippy::module_inception)]
mod table_schema;
pub(crate) mod validation;

pub use chart::{ChartDefinition, ChartType};
pub use column::{ColumnDescriptor, ColumnType};
pub use table_schema::{NewSchema, SchemaPatch, TableSchema};
pub use validation::{validate_storage_name, MAX_STORAGE_NAME_LEN};
