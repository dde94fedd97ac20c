//! API request types

use desa_tables_core::row::RowData;
use desa_tables_core::schema::{ChartDefinition, NewSchema, SchemaPatch};

use crate::ResponseSender;

/// API request from the REST server
#[derive(Debug)]
pub enum ApiRequest {
    /// Create schema
    CreateSchema {
        schema: NewSchema,
        response: ResponseSender,
    },
    /// Get schema by ID
    GetSchema { id: u64, response: ResponseSender },
    /// Get schema by storage name
    GetSchemaByStorageName {
        storage_name: String,
        response: ResponseSender,
    },
    /// List all schemas
    ListSchemas { response: ResponseSender },
    /// Patch a schema definition
    UpdateSchema {
        id: u64,
        patch: SchemaPatch,
        response: ResponseSender,
    },
    /// Delete schema with its rows
    DeleteSchema { id: u64, response: ResponseSender },
    /// Insert a row
    InsertRow {
        schema_id: u64,
        data: RowData,
        response: ResponseSender,
    },
    /// Get row by ID
    GetRow { id: u64, response: ResponseSender },
    /// Replace a row's data
    UpdateRow {
        id: u64,
        data: RowData,
        response: ResponseSender,
    },
    /// Delete row
    DeleteRow { id: u64, response: ResponseSender },
    /// One page of rows
    ListRows {
        schema_id: u64,
        /// 1-based page, `None` for the first page
        page: Option<usize>,
        /// `None` for the configured default
        page_size: Option<usize>,
        response: ResponseSender,
    },
    /// Footer totals
    ColumnTotals {
        schema_id: u64,
        response: ResponseSender,
    },
    /// Every stored chart with its points
    ChartSeries {
        schema_id: u64,
        response: ResponseSender,
    },
    /// Ad-hoc chart aggregation
    Aggregate {
        schema_id: u64,
        chart: ChartDefinition,
        response: ResponseSender,
    },
    /// Save the catalog now
    Flush { response: ResponseSender },
}

impl ApiRequest {
    /// Returns true if this request changes a schema definition.
    pub fn is_ddl(&self) -> bool {
        match self {
            ApiRequest::CreateSchema { .. } => true,
            ApiRequest::UpdateSchema { .. } => true,
            ApiRequest::DeleteSchema { .. } => true,
            ApiRequest::GetSchema { .. } => false,
            ApiRequest::GetSchemaByStorageName { .. } => false,
            ApiRequest::ListSchemas { .. } => false,
            ApiRequest::InsertRow { .. } => false,
            ApiRequest::GetRow { .. } => false,
            ApiRequest::UpdateRow { .. } => false,
            ApiRequest::DeleteRow { .. } => false,
            ApiRequest::ListRows { .. } => false,
            ApiRequest::ColumnTotals { .. } => false,
            ApiRequest::ChartSeries { .. } => false,
            ApiRequest::Aggregate { .. } => false,
            ApiRequest::Flush { .. } => false,
        }
    }
}
