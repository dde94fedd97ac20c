//! Validation of schema definitions.

use std::collections::HashSet;

use super::chart::ChartDefinition;
use super::column::{ColumnDescriptor, ColumnType};
use super::table_schema::TableSchema;
use crate::error::TableError;

/// Maximum storage name length in bytes.
pub const MAX_STORAGE_NAME_LEN: usize = 64;

/// Validates a storage name.
///
/// Storage names start with a lowercase ASCII letter followed by lowercase
/// letters, digits, or underscores. They double as file stems on disk.
pub fn validate_storage_name(name: &str) -> Result<(), TableError> {
    let invalid = |reason: &str| TableError::InvalidStorageName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_STORAGE_NAME_LEN {
        return Err(invalid("longer than 64 characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("must start with a lowercase letter"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(invalid("only lowercase letters, digits and '_' are allowed"));
    }
    Ok(())
}

/// Validates column keys: non-empty list, non-blank keys, no duplicates.
pub(crate) fn validate_columns(columns: &[ColumnDescriptor]) -> Result<(), TableError> {
    if columns.is_empty() {
        return Err(TableError::InvalidColumnSet(
            "at least one column is required".to_string(),
        ));
    }

    let mut seen_keys = HashSet::new();
    for column in columns {
        if column.key.trim().is_empty() {
            return Err(TableError::InvalidColumnSet(
                "column keys must not be blank".to_string(),
            ));
        }
        if column.key.trim() != column.key {
            return Err(TableError::InvalidColumnSet(format!(
                "column key '{}' has surrounding whitespace",
                column.key
            )));
        }
        if !seen_keys.insert(column.key.as_str()) {
            return Err(TableError::InvalidColumnSet(format!(
                "duplicate column key '{}'",
                column.key
            )));
        }
    }
    Ok(())
}

/// Resolves the column a chart is computed over and checks type compatibility.
///
/// # Returns
/// The chart's value column and, when grouped, its category column.
pub(crate) fn resolve_chart<'a>(
    columns: &'a [ColumnDescriptor],
    chart: &ChartDefinition,
) -> Result<(&'a ColumnDescriptor, Option<&'a ColumnDescriptor>), TableError> {
    let find = |key: &str| columns.iter().find(|c| c.key == key);
    let invalid_reference = |key: &str| TableError::InvalidChartReference {
        chart: chart.title().to_string(),
        column: key.to_string(),
    };

    let column = find(&chart.column_key).ok_or_else(|| invalid_reference(&chart.column_key))?;

    if !chart.chart_type.supports(column.column_type) {
        return Err(TableError::InvalidAggregation {
            chart: chart.chart_type,
            column: column.key.clone(),
            column_type: column.column_type,
        });
    }

    let group = match &chart.group_by {
        None => None,
        Some(group_key) => {
            if column.column_type != ColumnType::Number {
                return Err(TableError::InvalidAggregation {
                    chart: chart.chart_type,
                    column: column.key.clone(),
                    column_type: column.column_type,
                });
            }
            let group = find(group_key).ok_or_else(|| invalid_reference(group_key))?;
            if group.column_type != ColumnType::Category {
                return Err(invalid_reference(group_key));
            }
            Some(group)
        }
    };

    Ok((column, group))
}

/// Validates every chart against the column set.
pub(crate) fn validate_charts(
    columns: &[ColumnDescriptor],
    charts: &[ChartDefinition],
) -> Result<(), TableError> {
    for chart in charts {
        resolve_chart(columns, chart)?;
    }
    Ok(())
}

/// Validates all definition invariants of a schema.
pub(crate) fn validate_definition(schema: &TableSchema) -> Result<(), TableError> {
    if schema.display_name.trim().is_empty() {
        return Err(TableError::InvalidDisplayName);
    }
    validate_storage_name(&schema.storage_name)?;
    validate_columns(&schema.columns)?;
    validate_charts(&schema.columns, schema.charts())?;
    Ok(())
}

/// Fills defaults that do not affect validity: blank labels fall back to keys,
/// blank descriptions become `None`, and names are trimmed.
pub(crate) fn normalize_definition(schema: &mut TableSchema) {
    schema.display_name = schema.display_name.trim().to_string();
    if schema
        .description
        .as_deref()
        .is_some_and(|d| d.trim().is_empty())
    {
        schema.description = None;
    }
    for column in &mut schema.columns {
        if column.label.trim().is_empty() {
            column.label = column.key.clone();
        }
    }
}
