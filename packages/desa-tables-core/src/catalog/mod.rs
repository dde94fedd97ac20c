//! Catalog container holding all schemas and their rows.
//!
//! All state lives behind one `RwLock`. Writes validate and commit while
//! holding the write lock, so a schema edit and a concurrent row write on the
//! same schema are serialized.

mod registry;
mod store;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::TableError;
use crate::row::Row;
use crate::schema::TableSchema;

/// A schema and the rows it owns, keyed by row ID (creation order).
#[derive(Debug, Clone)]
pub(crate) struct SchemaEntry {
    pub(crate) schema: TableSchema,
    pub(crate) rows: BTreeMap<u64, Row>,
}

/// Mutable catalog state guarded by the catalog lock.
#[derive(Debug)]
pub(crate) struct CatalogState {
    /// Schemas keyed by ID (insertion order)
    pub(crate) schemas: BTreeMap<u64, SchemaEntry>,
    /// Row ID to owning schema ID
    pub(crate) row_index: HashMap<u64, u64>,
    pub(crate) next_schema_id: u64,
    pub(crate) next_row_id: u64,
}

impl CatalogState {
    fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
            row_index: HashMap::new(),
            next_schema_id: 1,
            next_row_id: 1,
        }
    }

    pub(crate) fn entry(&self, schema_id: u64) -> Result<&SchemaEntry, TableError> {
        self.schemas
            .get(&schema_id)
            .ok_or(TableError::SchemaNotFound { id: schema_id })
    }

    pub(crate) fn entry_mut(&mut self, schema_id: u64) -> Result<&mut SchemaEntry, TableError> {
        self.schemas
            .get_mut(&schema_id)
            .ok_or(TableError::SchemaNotFound { id: schema_id })
    }

    /// Returns the schema ID that owns `row_id`.
    pub(crate) fn owner_of(&self, row_id: u64) -> Result<u64, TableError> {
        self.row_index
            .get(&row_id)
            .copied()
            .ok_or(TableError::RowNotFound { id: row_id })
    }
}

/// Point-in-time copy of the catalog used by persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub next_schema_id: u64,
    pub next_row_id: u64,
    /// Schemas in ID order, each with its rows in creation order
    pub tables: Vec<(TableSchema, Vec<Row>)>,
    /// Catalog generation the snapshot was taken at
    pub generation: u64,
}

/// Catalog of admin-defined tables.
#[derive(Debug)]
pub struct Catalog {
    state: RwLock<CatalogState>,
    /// Bumped on every committed mutation
    generation: AtomicU64,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Rebuilds a catalog from a snapshot.
    ///
    /// The snapshot is trusted; persistence validates it before calling this.
    pub fn restore(snapshot: CatalogSnapshot) -> Self {
        let mut state = CatalogState::new();
        state.next_schema_id = snapshot.next_schema_id;
        state.next_row_id = snapshot.next_row_id;

        for (schema, rows) in snapshot.tables {
            let schema_id = schema.id;
            let mut entry = SchemaEntry {
                schema,
                rows: BTreeMap::new(),
            };
            for row in rows {
                state.row_index.insert(row.id, schema_id);
                entry.rows.insert(row.id, row);
            }
            state.schemas.insert(schema_id, entry);
        }

        Self {
            state: RwLock::new(state),
            generation: AtomicU64::new(snapshot.generation),
        }
    }

    /// Takes a consistent copy of all schemas and rows.
    pub fn snapshot(&self) -> Result<CatalogSnapshot, TableError> {
        let state = self.read()?;
        let tables = state
            .schemas
            .values()
            .map(|entry| (entry.schema.clone(), entry.rows.values().cloned().collect()))
            .collect();
        Ok(CatalogSnapshot {
            next_schema_id: state.next_schema_id,
            next_row_id: state.next_row_id,
            tables,
            generation: self.generation(),
        })
    }

    /// Returns the current mutation generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn mark_changed(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, CatalogState>, TableError> {
        self.state.read().map_err(|_| TableError::LockPoisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogState>, TableError> {
        self.state.write().map_err(|_| TableError::LockPoisoned)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
