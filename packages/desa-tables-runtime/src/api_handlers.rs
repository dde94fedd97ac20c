//! API request handlers

use std::sync::Arc;

use desa_tables_core::config::TablesConfig;
use desa_tables_core::persistence::PersistenceManager;
use desa_tables_core::row::{row_total, Row, RowView};
use desa_tables_core::{Catalog, TableError};
use serde::Serialize;
use serde_json::Value;

use crate::api_request::ApiRequest;
use crate::Result;

/// Executes API requests against the catalog.
pub struct ApiHandlers {
    catalog: Arc<Catalog>,
    config: TablesConfig,
    persistence: Arc<PersistenceManager>,
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| TableError::SerializationError(e.to_string()))
}

impl ApiHandlers {
    /// Create new API handlers
    pub fn new(
        catalog: Arc<Catalog>,
        config: TablesConfig,
        persistence: Arc<PersistenceManager>,
    ) -> Self {
        Self {
            catalog,
            config,
            persistence,
        }
    }

    /// Attaches the row total of the owning schema.
    fn row_view(&self, row: Row) -> Result<Value> {
        let schema = self.catalog.get_schema(row.schema_id)?;
        let row_total = row_total(&schema, &row.data);
        to_json(&RowView { row, row_total })
    }

    /// Handle API request
    ///
    /// Operation errors are sent back to the caller; a dropped receiver is
    /// logged and ignored.
    pub fn handle_api_request(&self, req: ApiRequest) -> Result<()> {
        match req {
            ApiRequest::CreateSchema { schema, response } => {
                tracing::info!("Creating schema '{}'", schema.storage_name);
                let result = self
                    .catalog
                    .create_schema(schema)
                    .and_then(|s| to_json(&s));
                Self::reply(response, result);
            }
            ApiRequest::GetSchema { id, response } => {
                let result = self.catalog.get_schema(id).and_then(|s| to_json(&s));
                Self::reply(response, result);
            }
            ApiRequest::GetSchemaByStorageName {
                storage_name,
                response,
            } => {
                let result = self
                    .catalog
                    .get_schema_by_storage_name(&storage_name)
                    .and_then(|s| to_json(&s));
                Self::reply(response, result);
            }
            ApiRequest::ListSchemas { response } => {
                let result = self.catalog.list_schemas().and_then(|s| to_json(&s));
                Self::reply(response, result);
            }
            ApiRequest::UpdateSchema {
                id,
                patch,
                response,
            } => {
                tracing::info!("Updating schema {}", id);
                let result = self
                    .catalog
                    .update_schema(id, patch)
                    .and_then(|s| to_json(&s));
                Self::reply(response, result);
            }
            ApiRequest::DeleteSchema { id, response } => {
                tracing::info!("Deleting schema {}", id);
                let result = self.catalog.delete_schema(id).map(|()| Value::Null);
                Self::reply(response, result);
            }
            ApiRequest::InsertRow {
                schema_id,
                data,
                response,
            } => {
                let result = self
                    .catalog
                    .insert_row(schema_id, data)
                    .and_then(|row| self.row_view(row));
                Self::reply(response, result);
            }
            ApiRequest::GetRow { id, response } => {
                let result = self
                    .catalog
                    .get_row(id)
                    .and_then(|row| self.row_view(row));
                Self::reply(response, result);
            }
            ApiRequest::UpdateRow { id, data, response } => {
                let result = self
                    .catalog
                    .update_row(id, data)
                    .and_then(|row| self.row_view(row));
                Self::reply(response, result);
            }
            ApiRequest::DeleteRow { id, response } => {
                let result = self.catalog.delete_row(id).map(|()| Value::Null);
                Self::reply(response, result);
            }
            ApiRequest::ListRows {
                schema_id,
                page,
                page_size,
                response,
            } => {
                let result = self
                    .catalog
                    .list_rows(
                        schema_id,
                        page.unwrap_or(1),
                        page_size.unwrap_or(self.config.default_page_size),
                        self.config.max_page_size,
                    )
                    .and_then(|p| to_json(&p));
                Self::reply(response, result);
            }
            ApiRequest::ColumnTotals {
                schema_id,
                response,
            } => {
                let result = self
                    .catalog
                    .column_totals(schema_id)
                    .and_then(|t| to_json(&t));
                Self::reply(response, result);
            }
            ApiRequest::ChartSeries {
                schema_id,
                response,
            } => {
                let result = self
                    .catalog
                    .chart_series(schema_id)
                    .and_then(|s| to_json(&s));
                Self::reply(response, result);
            }
            ApiRequest::Aggregate {
                schema_id,
                chart,
                response,
            } => {
                let result = self
                    .catalog
                    .compute_aggregate(schema_id, &chart)
                    .and_then(|points| to_json(&points));
                Self::reply(response, result);
            }
            ApiRequest::Flush { response } => {
                tracing::info!("Flushing catalog to {}", self.persistence.data_dir().display());
                let result = self
                    .persistence
                    .save_catalog(&self.catalog)
                    .map(|()| serde_json::json!({ "generation": self.catalog.generation() }));
                Self::reply(response, result);
            }
        }
        Ok(())
    }

    fn reply(response: crate::ResponseSender, result: Result<Value>) {
        if let Err(ref e) = result {
            tracing::debug!("Request failed: {}", e);
        }
        if response.send(result).is_err() {
            tracing::warn!("API caller dropped before the response was sent");
        }
    }
}
