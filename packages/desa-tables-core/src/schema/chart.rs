//! Chart definitions bound to schema columns.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::column::ColumnType;

/// Visualization kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Pie,
    Line,
}

impl ChartType {
    /// Returns the lowercase wire name of the chart type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Line => "line",
        }
    }

    /// Returns true if a chart of this type can be computed over a column of `column_type`.
    ///
    /// Category columns are counted (bar, pie); number columns are summed (bar, pie, line).
    pub fn supports(&self, column_type: ColumnType) -> bool {
        match column_type {
            ColumnType::Category => matches!(self, ChartType::Bar | ChartType::Pie),
            ColumnType::Number => true,
            ColumnType::Text | ColumnType::Date => false,
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared visualization over one schema column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDefinition {
    /// Chart kind
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Column the chart is computed over
    pub column_key: String,
    /// Chart title
    #[serde(default)]
    pub label: String,
    /// Category column used to group a number column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

impl ChartDefinition {
    /// Creates an ungrouped chart definition.
    pub fn new(chart_type: ChartType, column_key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            chart_type,
            column_key: column_key.into(),
            label: label.into(),
            group_by: None,
        }
    }

    /// Groups the chart by a category column.
    pub fn grouped_by(mut self, category_key: impl Into<String>) -> Self {
        self.group_by = Some(category_key.into());
        self
    }

    /// Returns the label shown for the chart, falling back to the column key.
    pub fn title(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.column_key
        } else {
            &self.label
        }
    }
}
