//! Row store operations and derived views.

use chrono::Utc;

use super::Catalog;
use crate::aggregate::{self, AggregatePoint, ChartSeries};
use crate::error::TableError;
use crate::row::validation::normalize_row;
use crate::row::{column_totals, row_total, ColumnTotals, Row, RowData, RowPage, RowView};
use crate::schema::ChartDefinition;

impl Catalog {
    /// Inserts a row into a schema.
    ///
    /// Validation and insertion happen under the same write lock, against the
    /// schema's current definition.
    ///
    /// # Errors
    /// `SchemaNotFound`, `UnknownColumn`, `MissingRequiredColumn`, `TypeMismatch`.
    pub fn insert_row(&self, schema_id: u64, data: RowData) -> Result<Row, TableError> {
        let mut state = self.write()?;
        let data = normalize_row(&state.entry(schema_id)?.schema, &data)?;

        let now = Utc::now();
        let row = Row {
            id: state.next_row_id,
            schema_id,
            data,
            created_at: now,
            updated_at: now,
        };
        state.next_row_id += 1;
        state.row_index.insert(row.id, schema_id);
        state.entry_mut(schema_id)?.rows.insert(row.id, row.clone());
        self.mark_changed();

        tracing::debug!("Inserted row {} into schema {}", row.id, schema_id);
        Ok(row)
    }

    /// Gets a row by ID.
    pub fn get_row(&self, row_id: u64) -> Result<Row, TableError> {
        let state = self.read()?;
        let schema_id = state.owner_of(row_id)?;
        state
            .entry(schema_id)?
            .rows
            .get(&row_id)
            .cloned()
            .ok_or(TableError::RowNotFound { id: row_id })
    }

    /// Replaces a row's data wholesale.
    ///
    /// Submitting data equal to the stored data leaves the row untouched.
    pub fn update_row(&self, row_id: u64, data: RowData) -> Result<Row, TableError> {
        let mut state = self.write()?;
        let schema_id = state.owner_of(row_id)?;
        let data = normalize_row(&state.entry(schema_id)?.schema, &data)?;

        let row = state
            .entry_mut(schema_id)?
            .rows
            .get_mut(&row_id)
            .ok_or(TableError::RowNotFound { id: row_id })?;
        if row.data == data {
            return Ok(row.clone());
        }
        row.data = data;
        row.updated_at = Utc::now();
        let updated = row.clone();
        self.mark_changed();

        tracing::debug!("Updated row {} in schema {}", row_id, schema_id);
        Ok(updated)
    }

    /// Deletes a row.
    pub fn delete_row(&self, row_id: u64) -> Result<(), TableError> {
        let mut state = self.write()?;
        let schema_id = state.owner_of(row_id)?;
        state
            .entry_mut(schema_id)?
            .rows
            .remove(&row_id)
            .ok_or(TableError::RowNotFound { id: row_id })?;
        state.row_index.remove(&row_id);
        self.mark_changed();

        tracing::debug!("Deleted row {} from schema {}", row_id, schema_id);
        Ok(())
    }

    /// Returns one page of rows in creation order.
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `page_size` - Rows per page, clamped to `max_page_size`
    ///
    /// # Errors
    /// `SchemaNotFound`, or `InvalidPagination` when `page` or `page_size` is 0.
    pub fn list_rows(
        &self,
        schema_id: u64,
        page: usize,
        page_size: usize,
        max_page_size: usize,
    ) -> Result<RowPage, TableError> {
        if page == 0 || page_size == 0 {
            return Err(TableError::InvalidPagination { page, page_size });
        }
        let page_size = page_size.min(max_page_size.max(1));

        let state = self.read()?;
        let entry = state.entry(schema_id)?;
        let total_rows = entry.rows.len();
        let skip = (page - 1).saturating_mul(page_size);

        let rows = entry
            .rows
            .values()
            .skip(skip)
            .take(page_size)
            .map(|row| RowView {
                row: row.clone(),
                row_total: row_total(&entry.schema, &row.data),
            })
            .collect();

        Ok(RowPage {
            rows,
            page,
            page_size,
            total_rows,
            total_pages: total_rows.div_ceil(page_size),
        })
    }

    /// Returns the number of rows owned by a schema.
    pub fn row_count(&self, schema_id: u64) -> Result<usize, TableError> {
        Ok(self.read()?.entry(schema_id)?.rows.len())
    }

    /// Computes the series of a chart over all rows of a schema.
    ///
    /// The chart does not need to be stored on the schema.
    pub fn compute_aggregate(
        &self,
        schema_id: u64,
        chart: &ChartDefinition,
    ) -> Result<Vec<AggregatePoint>, TableError> {
        let state = self.read()?;
        let entry = state.entry(schema_id)?;
        aggregate::compute(&entry.schema, chart, entry.rows.values())
    }

    /// Computes every chart stored on a schema.
    pub fn chart_series(&self, schema_id: u64) -> Result<Vec<ChartSeries>, TableError> {
        let state = self.read()?;
        let entry = state.entry(schema_id)?;
        entry
            .schema
            .charts()
            .iter()
            .map(|chart| {
                Ok(ChartSeries {
                    chart: chart.clone(),
                    points: aggregate::compute(&entry.schema, chart, entry.rows.values())?,
                })
            })
            .collect()
    }

    /// Computes footer totals of a schema's number columns.
    pub fn column_totals(&self, schema_id: u64) -> Result<ColumnTotals, TableError> {
        let state = self.read()?;
        let entry = state.entry(schema_id)?;
        Ok(column_totals(&entry.schema, entry.rows.values()))
    }
}
