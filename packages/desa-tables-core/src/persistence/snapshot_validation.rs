//! Snapshot validation logic for corruption detection.

use std::collections::{BTreeMap, HashSet};

use crate::error::TableError;
use crate::row::validation::normalize_row;
use crate::row::Row;
use crate::schema::validation::validate_definition;
use crate::schema::TableSchema;

use super::snapshot::SchemaFile;

/// Validates a loaded snapshot.
///
/// # Arguments
/// * `schema_file` - Parsed `schema.json`
/// * `rows` - Rows loaded from each data file, keyed by storage name
///
/// # Returns
/// `Result<(), TableError>` with `DataCorruption` describing the first problem.
pub fn validate_snapshot(
    schema_file: &SchemaFile,
    rows: &BTreeMap<String, Vec<Row>>,
) -> Result<(), TableError> {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    for schema in &schema_file.schemas {
        if schema.id == 0 || schema.id >= schema_file.next_schema_id {
            return Err(TableError::DataCorruption(format!(
                "Schema '{}' has id {} outside the allocated range (next {})",
                schema.storage_name, schema.id, schema_file.next_schema_id
            )));
        }
        if !seen_ids.insert(schema.id) {
            return Err(TableError::DataCorruption(format!(
                "Duplicate schema id {}",
                schema.id
            )));
        }
        if !seen_names.insert(schema.storage_name.as_str()) {
            return Err(TableError::DataCorruption(format!(
                "Duplicate storage name '{}'",
                schema.storage_name
            )));
        }
        validate_definition(schema).map_err(|e| {
            TableError::DataCorruption(format!(
                "Invalid definition for schema '{}': {}",
                schema.storage_name, e
            ))
        })?;
    }

    let mut seen_rows = HashSet::new();
    for schema in &schema_file.schemas {
        let Some(schema_rows) = rows.get(&schema.storage_name) else {
            continue;
        };
        for row in schema_rows {
            validate_row(schema, row, schema_file.next_row_id)?;
            if !seen_rows.insert(row.id) {
                return Err(TableError::DataCorruption(format!(
                    "Duplicate row id {}",
                    row.id
                )));
            }
        }
    }

    Ok(())
}

/// Validates a single stored row against its schema.
fn validate_row(schema: &TableSchema, row: &Row, next_row_id: u64) -> Result<(), TableError> {
    if row.schema_id != schema.id {
        return Err(TableError::DataCorruption(format!(
            "Row {} in '{}' belongs to schema {}",
            row.id, schema.storage_name, row.schema_id
        )));
    }
    if row.id == 0 || row.id >= next_row_id {
        return Err(TableError::DataCorruption(format!(
            "Row {} in '{}' is outside the allocated range (next {})",
            row.id, schema.storage_name, next_row_id
        )));
    }

    let normalized = normalize_row(schema, &row.data).map_err(|e| {
        TableError::DataCorruption(format!(
            "Row {} in '{}' is invalid: {}",
            row.id, schema.storage_name, e
        ))
    })?;
    if normalized != row.data {
        return Err(TableError::DataCorruption(format!(
            "Row {} in '{}' does not match the column layout",
            row.id, schema.storage_name
        )));
    }
    Ok(())
}
