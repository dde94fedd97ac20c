//! Validation of row data against a schema.

use chrono::NaiveDate;
use serde_json::Value;

use super::row::RowData;
use crate::error::TableError;
use crate::schema::{ColumnDescriptor, ColumnType, TableSchema};

/// Returns the JSON type name of a value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns true if `s` is an existing calendar date in `YYYY-MM-DD` form.
pub(crate) fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Checks that a non-null value matches the column type.
fn check_value(column: &ColumnDescriptor, value: &Value) -> Result<(), TableError> {
    let matches = match column.column_type {
        ColumnType::Number => value.is_number(),
        ColumnType::Text | ColumnType::Category => value.is_string(),
        ColumnType::Date => value.as_str().is_some_and(is_iso_date),
    };
    if matches {
        return Ok(());
    }

    Err(TableError::TypeMismatch {
        column: column.key.clone(),
        expected: column.column_type,
        actual: json_type_name(value).to_string(),
    })
}

/// Validates `data` against `schema` and returns the normalized row data.
///
/// Unknown keys are reported first, then columns are checked in schema order.
/// Blank strings count as absent. The result holds one entry per column in
/// schema order, with null for absent optional columns.
pub(crate) fn normalize_row(schema: &TableSchema, data: &RowData) -> Result<RowData, TableError> {
    if let Some(unknown) = data.keys().find(|key| schema.column(key).is_none()) {
        return Err(TableError::UnknownColumn(unknown.clone()));
    }

    let mut normalized = RowData::with_capacity(schema.columns.len());
    for column in &schema.columns {
        let value = match data.get(&column.key) {
            None | Some(Value::Null) => Value::Null,
            Some(Value::String(s)) if s.trim().is_empty() => Value::Null,
            Some(value) => value.clone(),
        };

        if value.is_null() {
            if column.required {
                return Err(TableError::MissingRequiredColumn(column.key.clone()));
            }
        } else {
            check_value(column, &value)?;
        }

        normalized.insert(column.key.clone(), value);
    }
    Ok(normalized)
}
