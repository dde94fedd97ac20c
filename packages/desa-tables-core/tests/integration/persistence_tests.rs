//! Flush and recovery through the persistence manager.

use ntest::timeout;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

use desa_tables_core::config::TablesConfig;
use desa_tables_core::persistence::PersistenceManager;
use desa_tables_core::{Catalog, TableError};

use super::helpers::{budget_schema, population_schema, row};

fn config_for(dir: &std::path::Path) -> TablesConfig {
    TablesConfig {
        data_dir: dir.to_path_buf(),
        persistence_interval_ticks: 5,
        ..Default::default()
    }
}

#[timeout(5000)]
#[test]
fn test_restart_preserves_tables_and_counters() {
    let temp_dir = tempdir().unwrap();
    let config = config_for(temp_dir.path());

    let (population_id, last_row_id) = {
        let persistence = PersistenceManager::new(&config);
        let catalog = Catalog::new();
        let population = catalog.create_schema(population_schema()).unwrap();
        let budget = catalog.create_schema(budget_schema()).unwrap();
        let mut last = 0;
        for i in 0..25 {
            last = catalog
                .insert_row(
                    population.id,
                    row(json!({"dusun": format!("Dusun {}", i % 4), "jumlah_l": i, "jumlah_p": i * 2})),
                )
                .unwrap()
                .id;
        }
        catalog
            .insert_row(
                budget.id,
                row(json!({"bidang": "Pembangunan", "kegiatan": "Jalan", "anggaran": 1.5e8})),
            )
            .unwrap();
        persistence.save_catalog(&catalog).unwrap();
        (population.id, last)
    };

    let persistence = PersistenceManager::new(&config);
    let catalog = persistence.load_catalog().unwrap();

    let names: Vec<String> = catalog
        .list_schemas()
        .unwrap()
        .into_iter()
        .map(|s| s.storage_name)
        .collect();
    assert_eq!(names, vec!["penduduk_dusun", "apbdes"]);
    assert_eq!(catalog.row_count(population_id).unwrap(), 25);
    assert_eq!(
        catalog.column_totals(population_id).unwrap().grand_total,
        Some(900.0)
    );

    // IDs keep growing past what was persisted
    let next = catalog
        .insert_row(
            population_id,
            row(json!({"dusun": "Baru", "jumlah_l": 1, "jumlah_p": 1})),
        )
        .unwrap();
    assert!(next.id > last_row_id + 1);
}

#[timeout(5000)]
#[test]
fn test_tick_flush_with_concurrent_writes() {
    let temp_dir = tempdir().unwrap();
    let config = config_for(temp_dir.path());
    let persistence = PersistenceManager::new(&config);
    let catalog = Arc::new(Catalog::new());
    let schema = catalog.create_schema(population_schema()).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                for i in 0..50 {
                    catalog
                        .insert_row(
                            schema.id,
                            row(json!({"dusun": format!("W{}", w), "jumlah_l": i, "jumlah_p": 0})),
                        )
                        .unwrap();
                }
            })
        })
        .collect();

    for _ in 0..20 {
        persistence.tick(&catalog).unwrap();
    }
    for writer in writers {
        writer.join().unwrap();
    }
    persistence.flush_if_dirty(&catalog).unwrap();

    let restored = PersistenceManager::new(&config).load_catalog().unwrap();
    assert_eq!(restored.row_count(schema.id).unwrap(), 200);
    assert_eq!(
        restored.snapshot().unwrap().tables,
        catalog.snapshot().unwrap().tables
    );
}

#[timeout(5000)]
#[test]
fn test_corrupted_row_rejected_on_load() {
    let temp_dir = tempdir().unwrap();
    let config = config_for(temp_dir.path());
    let persistence = PersistenceManager::new(&config);
    let catalog = Catalog::new();
    let schema = catalog.create_schema(population_schema()).unwrap();
    catalog
        .insert_row(
            schema.id,
            row(json!({"dusun": "Krajan", "jumlah_l": 1, "jumlah_p": 2})),
        )
        .unwrap();
    persistence.save_catalog(&catalog).unwrap();

    // Rewrite the data file with a wrong type and a matching checksum.
    let schema_path = temp_dir.path().join("schema.json");
    let mut schema_json: serde_json::Value =
        serde_json::from_slice(&fs::read(&schema_path).unwrap()).unwrap();
    let data_path = temp_dir
        .path()
        .join("data")
        .join(schema_json["dataFiles"]["penduduk_dusun"]["file"].as_str().unwrap());
    let mut rows: serde_json::Value =
        serde_json::from_slice(&fs::read(&data_path).unwrap()).unwrap();
    rows[0]["data"]["jumlah_l"] = json!("satu");
    let bytes = serde_json::to_vec_pretty(&rows).unwrap();
    fs::write(&data_path, &bytes).unwrap();

    schema_json["dataFiles"]["penduduk_dusun"]["checksum"] = json!(crc32fast::hash(&bytes));
    fs::write(&schema_path, serde_json::to_vec_pretty(&schema_json).unwrap()).unwrap();

    let err = persistence.load_catalog().unwrap_err();
    assert!(matches!(err, TableError::DataCorruption(ref msg) if msg.contains("jumlah_l")));
}
