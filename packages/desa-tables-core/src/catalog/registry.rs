//! Schema registry operations.

use std::collections::BTreeMap;

use chrono::Utc;

use super::{Catalog, SchemaEntry};
use crate::error::TableError;
use crate::row::validation::normalize_row;
use crate::schema::validation::{normalize_definition, validate_definition};
use crate::schema::{NewSchema, SchemaPatch, TableSchema};

impl Catalog {
    /// Creates a new schema.
    ///
    /// # Errors
    /// - `DuplicateStorageName` if another schema uses `storage_name`
    /// - `InvalidStorageName`, `InvalidDisplayName`, `InvalidColumnSet`
    /// - `InvalidChartReference` / `InvalidAggregation` for bad charts
    pub fn create_schema(&self, new_schema: NewSchema) -> Result<TableSchema, TableError> {
        let now = Utc::now();
        let mut schema = TableSchema {
            id: 0,
            display_name: new_schema.display_name,
            storage_name: new_schema.storage_name,
            description: new_schema.description,
            columns: new_schema.columns,
            has_row_total: new_schema.has_row_total,
            charts: new_schema.charts,
            created_at: now,
            updated_at: now,
        };
        normalize_definition(&mut schema);
        validate_definition(&schema)?;

        let mut state = self.write()?;
        if state
            .schemas
            .values()
            .any(|e| e.schema.storage_name == schema.storage_name)
        {
            return Err(TableError::DuplicateStorageName(schema.storage_name));
        }

        schema.id = state.next_schema_id;
        state.next_schema_id += 1;
        state.schemas.insert(
            schema.id,
            SchemaEntry {
                schema: schema.clone(),
                rows: BTreeMap::new(),
            },
        );
        self.mark_changed();

        tracing::info!(
            "Created schema {} '{}' with {} columns",
            schema.id,
            schema.storage_name,
            schema.columns.len()
        );
        Ok(schema)
    }

    /// Gets a schema by ID.
    pub fn get_schema(&self, id: u64) -> Result<TableSchema, TableError> {
        let state = self.read()?;
        Ok(state.entry(id)?.schema.clone())
    }

    /// Gets a schema by its storage name.
    pub fn get_schema_by_storage_name(&self, storage_name: &str) -> Result<TableSchema, TableError> {
        let state = self.read()?;
        state
            .schemas
            .values()
            .find(|e| e.schema.storage_name == storage_name)
            .map(|e| e.schema.clone())
            .ok_or_else(|| TableError::StorageNameNotFound {
                storage_name: storage_name.to_string(),
            })
    }

    /// Lists all schemas in insertion (ID) order.
    pub fn list_schemas(&self) -> Result<Vec<TableSchema>, TableError> {
        let state = self.read()?;
        Ok(state.schemas.values().map(|e| e.schema.clone()).collect())
    }

    /// Returns the number of schemas.
    pub fn schema_count(&self) -> Result<usize, TableError> {
        Ok(self.read()?.schemas.len())
    }

    /// Updates a schema definition.
    ///
    /// The merged definition is validated like a new one. Removing a column is
    /// rejected with `ColumnInUse` while any row holds a non-null value for it;
    /// columns holding only nulls are dropped from the rows. Every stored row
    /// must then satisfy the merged schema, otherwise the first row violation
    /// is returned and nothing changes.
    pub fn update_schema(&self, id: u64, patch: SchemaPatch) -> Result<TableSchema, TableError> {
        let mut state = self.write()?;
        let entry = state.entry(id)?;

        let mut merged = patch.apply(&entry.schema);
        normalize_definition(&mut merged);
        validate_definition(&merged)?;

        for key in patch.removed_columns(&entry.schema) {
            let rows = entry.rows.values().filter(|r| r.has_value(key)).count();
            if rows > 0 {
                return Err(TableError::ColumnInUse {
                    column: key.to_string(),
                    rows,
                });
            }
        }

        // Re-shape every row under the merged schema before touching state.
        let mut reshaped = Vec::with_capacity(entry.rows.len());
        for row in entry.rows.values() {
            let mut data = row.data.clone();
            data.retain(|key, _| merged.column(key).is_some());
            reshaped.push((row.id, normalize_row(&merged, &data)?));
        }

        merged.updated_at = Utc::now();
        let entry = state.entry_mut(id)?;
        for (row_id, data) in reshaped {
            if let Some(row) = entry.rows.get_mut(&row_id) {
                row.data = data;
            }
        }
        entry.schema = merged.clone();
        self.mark_changed();

        tracing::info!(
            "Updated schema {} '{}' ({} rows re-validated)",
            id,
            merged.storage_name,
            entry.rows.len()
        );
        Ok(merged)
    }

    /// Deletes a schema and every row it owns.
    pub fn delete_schema(&self, id: u64) -> Result<(), TableError> {
        let mut state = self.write()?;
        let entry = state
            .schemas
            .remove(&id)
            .ok_or(TableError::SchemaNotFound { id })?;
        for row_id in entry.rows.keys() {
            state.row_index.remove(row_id);
        }
        self.mark_changed();

        tracing::info!(
            "Deleted schema {} '{}' with {} rows",
            id,
            entry.schema.storage_name,
            entry.rows.len()
        );
        Ok(())
    }
}
