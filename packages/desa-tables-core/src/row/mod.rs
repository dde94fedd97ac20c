//! Rows, row validation, and derived totals.

#[allow(clippy::module_inception)]
mod row;
mod total;
pub(crate) mod validation;

pub use row::{Row, RowData, RowPage, RowView};
pub use total::{column_totals, row_total, ColumnTotal, ColumnTotals};
pub use validation::json_type_name;
