//! Row records and listing views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column key to value mapping, kept in schema column order.
pub type RowData = serde_json::Map<String, serde_json::Value>;

/// One record of data conforming to a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Row ID, monotonic across the catalog
    pub id: u64,
    /// Owning schema
    pub schema_id: u64,
    /// One entry per schema column
    pub data: RowData,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last data change
    pub updated_at: DateTime<Utc>,
}

impl Row {
    /// Returns true if the row holds a non-null value for `key`.
    pub fn has_value(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(|v| !v.is_null())
    }
}

/// Row as presented to readers, with the synthetic row total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    #[serde(flatten)]
    pub row: Row,
    /// Sum of number columns; present only when the schema has row totals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_total: Option<f64>,
}

/// One page of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPage {
    pub rows: Vec<RowView>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
}
