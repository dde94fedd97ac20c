//! Row totals and column totals. Never persisted.

use serde::Serialize;

use super::row::{Row, RowData};
use crate::schema::TableSchema;

/// Sums the non-null number columns of `data`.
fn numeric_sum(schema: &TableSchema, data: &RowData) -> f64 {
    schema
        .numeric_columns()
        .filter_map(|c| data.get(&c.key).and_then(|v| v.as_f64()))
        .sum()
}

/// Returns the synthetic row total, or `None` when the schema has no row totals.
pub fn row_total(schema: &TableSchema, data: &RowData) -> Option<f64> {
    schema
        .has_row_total
        .then(|| numeric_sum(schema, data))
}

/// Sum of one number column across all rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTotal {
    pub key: String,
    pub label: String,
    pub sum: f64,
}

/// Footer totals of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTotals {
    /// Number columns in column order
    pub columns: Vec<ColumnTotal>,
    /// Sum of all row totals, present only when the schema has row totals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<f64>,
}

/// Computes per-column sums of number columns over `rows`.
pub fn column_totals<'a>(
    schema: &TableSchema,
    rows: impl IntoIterator<Item = &'a Row>,
) -> ColumnTotals {
    let mut columns: Vec<ColumnTotal> = schema
        .numeric_columns()
        .map(|c| ColumnTotal {
            key: c.key.clone(),
            label: c.label.clone(),
            sum: 0.0,
        })
        .collect();

    for row in rows {
        for total in &mut columns {
            if let Some(value) = row.data.get(&total.key).and_then(|v| v.as_f64()) {
                total.sum += value;
            }
        }
    }

    let grand_total = schema
        .has_row_total
        .then(|| columns.iter().map(|c| c.sum).sum());

    ColumnTotals {
        columns,
        grand_total,
    }
}
