//! Table schema definition and update patches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chart::ChartDefinition;
use super::column::ColumnDescriptor;

/// Administrator-defined table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Schema ID
    pub id: u64,
    /// Human-readable name
    pub display_name: String,
    /// Unique machine-readable name, immutable after creation
    pub storage_name: String,
    /// Optional free text
    #[serde(default)]
    pub description: Option<String>,
    /// Columns in display order
    pub columns: Vec<ColumnDescriptor>,
    /// Whether number columns are summed into a synthetic row total
    #[serde(default)]
    pub has_row_total: bool,
    /// Charts in display order
    #[serde(default)]
    pub charts: Option<Vec<ChartDefinition>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last definition change
    pub updated_at: DateTime<Utc>,
}

impl TableSchema {
    /// Looks up a column by key.
    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Returns column keys in declaration order.
    pub fn column_keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    /// Returns number columns in declaration order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Returns the declared charts, empty when none are set.
    pub fn charts(&self) -> &[ChartDefinition] {
        self.charts.as_deref().unwrap_or(&[])
    }
}

/// Payload for creating a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchema {
    pub display_name: String,
    pub storage_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub has_row_total: bool,
    #[serde(default)]
    pub charts: Option<Vec<ChartDefinition>>,
}

impl NewSchema {
    /// Creates a payload with the given names and columns and no charts.
    pub fn new(
        display_name: impl Into<String>,
        storage_name: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            storage_name: storage_name.into(),
            description: None,
            columns,
            has_row_total: false,
            charts: None,
        }
    }

    pub fn with_row_total(mut self) -> Self {
        self.has_row_total = true;
        self
    }

    pub fn with_charts(mut self, charts: Vec<ChartDefinition>) -> Self {
        self.charts = Some(charts);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a schema definition.
///
/// The storage name is deliberately absent. A blank `description` clears it,
/// `charts: Some(vec![])` removes all charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaPatch {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<ColumnDescriptor>>,
    #[serde(default)]
    pub has_row_total: Option<bool>,
    #[serde(default)]
    pub charts: Option<Vec<ChartDefinition>>,
}

impl SchemaPatch {
    /// Returns the schema that results from applying this patch.
    pub fn apply(&self, schema: &TableSchema) -> TableSchema {
        let mut merged = schema.clone();
        if let Some(display_name) = &self.display_name {
            merged.display_name = display_name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = Some(description.clone());
        }
        if let Some(columns) = &self.columns {
            merged.columns = columns.clone();
        }
        if let Some(has_row_total) = self.has_row_total {
            merged.has_row_total = has_row_total;
        }
        if let Some(charts) = &self.charts {
            merged.charts = Some(charts.clone());
        }
        merged
    }

    /// Returns keys present in `schema` that the patched column list drops.
    pub fn removed_columns<'a>(&self, schema: &'a TableSchema) -> Vec<&'a str> {
        match &self.columns {
            Some(columns) => schema
                .column_keys()
                .filter(|key| !columns.iter().any(|c| c.key == *key))
                .collect(),
            None => Vec::new(),
        }
    }
}
