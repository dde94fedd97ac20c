//! Column descriptor within a table schema.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Free text
    Text,
    /// JSON number
    Number,
    /// ISO-8601 calendar date (`YYYY-MM-DD`)
    Date,
    /// Short text used for grouping
    Category,
}

impl ColumnType {
    /// Returns the lowercase wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Category => "category",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column definition within a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Key used in row data, unique within the schema
    pub key: String,
    /// Human-readable header
    #[serde(default)]
    pub label: String,
    /// Declared value type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether every row must hold a non-null value
    #[serde(default)]
    pub required: bool,
}

impl ColumnDescriptor {
    /// Creates an optional column.
    pub fn new(key: impl Into<String>, label: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column_type,
            required: false,
        }
    }

    /// Marks the column as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns true for number columns.
    pub fn is_numeric(&self) -> bool {
        self.column_type == ColumnType::Number
    }
}
