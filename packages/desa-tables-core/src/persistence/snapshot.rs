//! On-disk snapshot file formats.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::TableSchema;

/// Current `schema.json` version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// `schema.json`: schema definitions, ID counters, and the data files of one save.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFile {
    /// Snapshot format version
    pub version: u32,
    /// Sequence number of the save that wrote this file
    #[serde(default)]
    pub save_seq: u64,
    pub next_schema_id: u64,
    pub next_row_id: u64,
    /// Schemas in ID order
    pub schemas: Vec<TableSchema>,
    /// Data file of each schema, keyed by storage name
    #[serde(default)]
    pub data_files: BTreeMap<String, DataFileEntry>,
}

/// One data file referenced by `schema.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFileEntry {
    /// File name under `data/`, `<storage_name>.<save_seq>.json`
    pub file: String,
    /// CRC32 of the file contents
    pub checksum: u32,
}

impl DataFileEntry {
    /// Name of the data file written for `storage_name` by save `save_seq`.
    pub fn file_name(storage_name: &str, save_seq: u64) -> String {
        format!("{}.{}.json", storage_name, save_seq)
    }

    /// Whether `file` is a bare file name that stays inside `data/`.
    pub fn is_plain_file_name(&self) -> bool {
        !self.file.is_empty()
            && !self.file.contains(['/', '\\'])
            && self.file != "."
            && self.file != ".."
    }
}

/// The part of `schema.json` needed to pick the next save sequence.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SaveSeqHeader {
    #[serde(default)]
    pub save_seq: u64,
}
