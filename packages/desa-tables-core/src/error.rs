//! Table error types.

use thiserror::Error;

use crate::schema::{ChartType, ColumnType};

/// Errors raised by schema and row operations.
///
/// Validation variants are caller-facing and always reported before any
/// state change is committed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// Schema not found
    #[error("Schema {id} not found")]
    SchemaNotFound { id: u64 },

    /// Schema not found by storage name
    #[error("Schema '{storage_name}' not found")]
    StorageNameNotFound { storage_name: String },

    /// Row not found
    #[error("Row {id} not found")]
    RowNotFound { id: u64 },

    /// Storage name already used by another schema
    #[error("Storage name '{0}' already exists")]
    DuplicateStorageName(String),

    /// Storage name does not match the allowed format
    #[error("Invalid storage name '{name}': {reason}")]
    InvalidStorageName { name: String, reason: String },

    /// Display name is blank
    #[error("Display name must not be blank")]
    InvalidDisplayName,

    /// Column list is empty or has blank/duplicate keys
    #[error("Invalid column set: {0}")]
    InvalidColumnSet(String),

    /// Chart references a column that does not exist or cannot be grouped by
    #[error("Chart '{chart}' references invalid column '{column}'")]
    InvalidChartReference { chart: String, column: String },

    /// Column removal blocked because rows still hold values for it
    #[error("Column '{column}' is still used by {rows} row(s)")]
    ColumnInUse { column: String, rows: usize },

    /// Required column missing or null
    #[error("Missing required column '{0}'")]
    MissingRequiredColumn(String),

    /// Row data contains a key that is not a column of the schema
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// Value type does not match the declared column type
    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: String,
    },

    /// Chart type cannot be computed over the column type
    #[error("Cannot build a {chart} chart over {column_type} column '{column}'")]
    InvalidAggregation {
        chart: ChartType,
        column: String,
        column_type: ColumnType,
    },

    /// Page number or page size out of range
    #[error("Invalid pagination: page={page}, page_size={page_size}")]
    InvalidPagination { page: usize, page_size: usize },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected while loading a snapshot
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl TableError {
    /// Returns true for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TableError::SchemaNotFound { .. }
                | TableError::StorageNameNotFound { .. }
                | TableError::RowNotFound { .. }
        )
    }

    /// Returns true for errors caused by invalid caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TableError::DuplicateStorageName(_)
                | TableError::InvalidStorageName { .. }
                | TableError::InvalidDisplayName
                | TableError::InvalidColumnSet(_)
                | TableError::InvalidChartReference { .. }
                | TableError::ColumnInUse { .. }
                | TableError::MissingRequiredColumn(_)
                | TableError::UnknownColumn(_)
                | TableError::TypeMismatch { .. }
                | TableError::InvalidAggregation { .. }
                | TableError::InvalidPagination { .. }
        )
    }
}
