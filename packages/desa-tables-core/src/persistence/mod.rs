//! Snapshot persistence, data file flush/load, and recovery.
//!
//! Layout of the data directory:
//! - `schema.json`: schema definitions, ID counters, save sequence, and the
//!   name and checksum of each data file
//! - `data/<storage_name>.<save_seq>.json`: rows of one schema in creation order
//!
//! Every save writes its data files under fresh names, then replaces
//! `schema.json`. Files of earlier saves are removed only after that rename,
//! so the `schema.json` on disk always references complete data files.

pub mod io_utils;
pub mod snapshot;
mod snapshot_validation;


use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::{Catalog, CatalogSnapshot};
use crate::config::TablesConfig;
use crate::error::TableError;
use crate::row::Row;

use io_utils::{checksum, classify_io_error, retry_io_operation, write_atomic};
use snapshot::{DataFileEntry, SaveSeqHeader, SchemaFile, SNAPSHOT_VERSION};

pub use snapshot_validation::validate_snapshot;

const SCHEMA_FILE: &str = "schema.json";
const DATA_DIR: &str = "data";

/// Persistence manager for schema and data files.
#[derive(Debug)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    /// Flush interval in ticks
    flush_interval_ticks: u32,
    /// Current tick count
    tick_count: AtomicU64,
    /// Catalog generation written by the last successful save
    saved_generation: AtomicU64,
    /// Sequence of the committed `schema.json`, 0 until loaded or saved
    save_seq: AtomicU64,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a new persistence manager with the given configuration.
    pub fn new(config: &TablesConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            flush_interval_ticks: config.persistence_interval_ticks.max(1),
            tick_count: AtomicU64::new(0),
            saved_generation: AtomicU64::new(0),
            save_seq: AtomicU64::new(0),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Returns the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn data_file_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(DATA_DIR).join(file)
    }

    /// Saves the whole catalog to disk.
    ///
    /// # Arguments
    /// * `catalog` - Catalog to save
    ///
    /// # Returns
    /// `Result<(), TableError>` indicating success or failure.
    pub fn save_catalog(&self, catalog: &Catalog) -> Result<(), TableError> {
        let snapshot = catalog.snapshot()?;
        self.save_snapshot(&snapshot)?;
        self.saved_generation
            .store(snapshot.generation, Ordering::Release);
        Ok(())
    }

    /// Sequence number for the next save.
    ///
    /// A manager that has neither loaded nor saved reads the committed
    /// sequence from disk, so it never reuses a referenced file name.
    fn next_save_seq(&self) -> Result<u64, TableError> {
        let mut current = self.save_seq.load(Ordering::Acquire);
        if current == 0 {
            let schema_path = self.data_dir.join(SCHEMA_FILE);
            if schema_path.exists() {
                let contents = self.with_retry(
                    || {
                        fs::read(&schema_path)
                            .map_err(|e| classify_io_error(e, "Failed to read schema file"))
                    },
                    "schema read",
                )?;
                let header: SaveSeqHeader = serde_json::from_slice(&contents).map_err(|e| {
                    TableError::SerializationError(format!("Failed to parse schema: {}", e))
                })?;
                current = header.save_seq;
            }
        }
        Ok(current + 1)
    }

    fn save_snapshot(&self, snapshot: &CatalogSnapshot) -> Result<(), TableError> {
        let data_dir = self.data_dir.join(DATA_DIR);
        fs::create_dir_all(&data_dir)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

        let save_seq = self.next_save_seq()?;
        let mut data_files = BTreeMap::new();
        let mut schemas = Vec::with_capacity(snapshot.tables.len());
        for (schema, rows) in &snapshot.tables {
            let bytes = serde_json::to_vec_pretty(rows)
                .map_err(|e| TableError::SerializationError(e.to_string()))?;
            let file = DataFileEntry::file_name(&schema.storage_name, save_seq);
            let path = self.data_file_path(&file);
            self.with_retry(|| write_atomic(&path, &bytes), "data file write")?;
            data_files.insert(
                schema.storage_name.clone(),
                DataFileEntry {
                    file,
                    checksum: checksum(&bytes),
                },
            );
            schemas.push(schema.clone());
        }

        let schema_file = SchemaFile {
            version: SNAPSHOT_VERSION,
            save_seq,
            next_schema_id: snapshot.next_schema_id,
            next_row_id: snapshot.next_row_id,
            schemas,
            data_files,
        };
        let schema_json = serde_json::to_vec_pretty(&schema_file)
            .map_err(|e| TableError::SerializationError(e.to_string()))?;
        let schema_path = self.data_dir.join(SCHEMA_FILE);
        self.with_retry(|| write_atomic(&schema_path, &schema_json), "schema write")?;
        self.save_seq.store(save_seq, Ordering::Release);

        // The save is committed; leftovers only cost disk space.
        if let Err(e) = self.remove_unreferenced_data_files(&schema_file) {
            tracing::warn!("Failed to remove superseded data files: {}", e);
        }

        tracing::debug!(
            "Saved {} schemas at generation {} (save {})",
            schema_file.schemas.len(),
            snapshot.generation,
            save_seq
        );
        Ok(())
    }

    /// Removes every file under `data/` that `schema_file` does not reference:
    /// files of earlier saves, of deleted schemas, and of interrupted saves.
    fn remove_unreferenced_data_files(&self, schema_file: &SchemaFile) -> Result<(), TableError> {
        let live: HashSet<&str> = schema_file
            .data_files
            .values()
            .map(|entry| entry.file.as_str())
            .collect();

        let entries = fs::read_dir(self.data_dir.join(DATA_DIR))
            .map_err(|e| classify_io_error(e, "Failed to list data directory"))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| classify_io_error(e, "Failed to read data directory entry"))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if live.contains(name) || !entry.path().is_file() {
                continue;
            }
            fs::remove_file(entry.path())
                .map_err(|e| classify_io_error(e, "Failed to remove data file"))?;
            tracing::debug!("Removed unreferenced data file {}", name);
        }
        Ok(())
    }

    /// Loads the catalog from disk.
    ///
    /// A missing `schema.json` yields an empty catalog.
    ///
    /// # Errors
    /// - `SerializationError` for unreadable JSON or an unsupported version
    /// - `DataCorruption` for checksum mismatches, missing data files, or
    ///   content that violates schema or row invariants
    pub fn load_catalog(&self) -> Result<Catalog, TableError> {
        let schema_path = self.data_dir.join(SCHEMA_FILE);
        if !schema_path.exists() {
            return Ok(Catalog::new());
        }

        let contents = self.with_retry(
            || fs::read(&schema_path).map_err(|e| classify_io_error(e, "Failed to read schema file")),
            "schema read",
        )?;
        let schema_file: SchemaFile = serde_json::from_slice(&contents)
            .map_err(|e| TableError::SerializationError(format!("Failed to parse schema: {}", e)))?;

        if schema_file.version != SNAPSHOT_VERSION {
            return Err(TableError::SerializationError(format!(
                "Unsupported schema version: {}",
                schema_file.version
            )));
        }

        self.save_seq.store(schema_file.save_seq, Ordering::Release);

        let mut rows_by_name = BTreeMap::new();
        for schema in &schema_file.schemas {
            let rows = self.load_data_file(&schema.storage_name, &schema_file)?;
            rows_by_name.insert(schema.storage_name.clone(), rows);
        }

        validate_snapshot(&schema_file, &rows_by_name)?;

        let tables = schema_file
            .schemas
            .into_iter()
            .map(|schema| {
                let rows = rows_by_name.remove(&schema.storage_name).unwrap_or_default();
                (schema, rows)
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "Loaded {} schemas from {}",
            tables.len(),
            self.data_dir.display()
        );

        Ok(Catalog::restore(CatalogSnapshot {
            next_schema_id: schema_file.next_schema_id,
            next_row_id: schema_file.next_row_id,
            tables,
            generation: 0,
        }))
    }

    /// Reads and checksums the data file `schema_file` records for one schema.
    fn load_data_file(
        &self,
        storage_name: &str,
        schema_file: &SchemaFile,
    ) -> Result<Vec<Row>, TableError> {
        let entry = schema_file.data_files.get(storage_name).ok_or_else(|| {
            TableError::DataCorruption(format!("No data file recorded for '{}'", storage_name))
        })?;
        if !entry.is_plain_file_name() {
            return Err(TableError::DataCorruption(format!(
                "Invalid data file name '{}' for '{}'",
                entry.file, storage_name
            )));
        }

        let path = self.data_file_path(&entry.file);
        if !path.exists() {
            return Err(TableError::DataCorruption(format!(
                "Data file '{}' for '{}' is missing",
                entry.file, storage_name
            )));
        }
        let bytes = self.with_retry(
            || fs::read(&path).map_err(|e| classify_io_error(e, "Failed to read data file")),
            "data file read",
        )?;

        let actual = checksum(&bytes);
        if actual != entry.checksum {
            return Err(TableError::DataCorruption(format!(
                "Checksum mismatch for '{}': expected {:08x}, got {:08x}",
                storage_name, entry.checksum, actual
            )));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            TableError::DataCorruption(format!(
                "Failed to parse data file for '{}': {}",
                storage_name, e
            ))
        })
    }

    /// Saves the catalog if it changed since the last save.
    ///
    /// # Returns
    /// `true` if a save happened.
    pub fn flush_if_dirty(&self, catalog: &Catalog) -> Result<bool, TableError> {
        if catalog.generation() == self.saved_generation.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.save_catalog(catalog)?;
        Ok(true)
    }

    /// Advances the tick counter and flushes every `persistence_interval_ticks` ticks.
    pub fn tick(&self, catalog: &Catalog) -> Result<bool, TableError> {
        let tick = self.tick_count.fetch_add(1, Ordering::SeqCst) + 1;
        if tick % u64::from(self.flush_interval_ticks) != 0 {
            return Ok(false);
        }
        self.flush_if_dirty(catalog)
    }

    fn with_retry<F, T>(&self, operation: F, context: &str) -> Result<T, TableError>
    where
        F: Fn() -> Result<T, TableError>,
    {
        retry_io_operation(operation, self.max_retries, self.retry_delay_ms, context)
    }
}
