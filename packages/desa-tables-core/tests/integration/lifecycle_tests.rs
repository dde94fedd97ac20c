//! End-to-end catalog workflows.

use serde_json::json;

use desa_tables_core::aggregate::AggregatePoint;
use desa_tables_core::schema::{ChartDefinition, ChartType, ColumnDescriptor, ColumnType, SchemaPatch};
use desa_tables_core::{Catalog, TableError};

use super::helpers::{budget_schema, population_schema, row};

#[test]
fn test_population_table_lifecycle() {
    let catalog = Catalog::new();
    let schema = catalog.create_schema(population_schema()).unwrap();

    let first = catalog
        .insert_row(
            schema.id,
            row(json!({"dusun": "Krajan", "jumlah_l": 120, "jumlah_p": 131})),
        )
        .unwrap();
    catalog
        .insert_row(
            schema.id,
            row(json!({"dusun": "Sumberejo", "jumlah_l": 88, "jumlah_p": 90})),
        )
        .unwrap();
    catalog
        .insert_row(
            schema.id,
            row(json!({"dusun": "Krajan", "jumlah_l": 10, "jumlah_p": 12})),
        )
        .unwrap();

    let page = catalog.list_rows(schema.id, 1, 2, 500).unwrap();
    assert_eq!(page.total_rows, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.rows[0].row.id, first.id);
    assert_eq!(page.rows[0].row_total, Some(251.0));

    let totals = catalog.column_totals(schema.id).unwrap();
    assert_eq!(totals.columns[0].sum, 218.0);
    assert_eq!(totals.columns[1].sum, 233.0);
    assert_eq!(totals.grand_total, Some(451.0));

    let series = catalog.chart_series(schema.id).unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(
        series[0].points,
        vec![
            AggregatePoint {
                label: "Krajan".to_string(),
                value: 2.0
            },
            AggregatePoint {
                label: "Sumberejo".to_string(),
                value: 1.0
            },
        ]
    );

    catalog
        .update_row(
            first.id,
            row(json!({"dusun": "Krajan", "jumlah_l": 121, "jumlah_p": 131})),
        )
        .unwrap();
    catalog.delete_row(first.id).unwrap();
    assert!(matches!(
        catalog.get_row(first.id),
        Err(TableError::RowNotFound { .. })
    ));
    assert_eq!(catalog.row_count(schema.id).unwrap(), 2);

    catalog.delete_schema(schema.id).unwrap();
    assert!(catalog.list_schemas().unwrap().is_empty());
    assert!(matches!(
        catalog.list_rows(schema.id, 1, 20, 500),
        Err(TableError::SchemaNotFound { .. })
    ));
}

#[test]
fn test_budget_charts_group_and_per_row() {
    let catalog = Catalog::new();
    let schema = catalog.create_schema(budget_schema()).unwrap();

    for (bidang, kegiatan, anggaran) in [
        ("Pembangunan", "Jalan desa", 150_000_000),
        ("Pemberdayaan", "Pelatihan UMKM", 25_000_000),
        ("Pembangunan", "Drainase", 50_000_000),
    ] {
        catalog
            .insert_row(
                schema.id,
                row(json!({
                    "bidang": bidang,
                    "kegiatan": kegiatan,
                    "anggaran": anggaran,
                    "tanggal": "2026-03-01"
                })),
            )
            .unwrap();
    }

    let series = catalog.chart_series(schema.id).unwrap();
    assert_eq!(series.len(), 2);

    let grouped: Vec<(&str, f64)> = series[0]
        .points
        .iter()
        .map(|p| (p.label.as_str(), p.value))
        .collect();
    assert_eq!(
        grouped,
        vec![("Pembangunan", 200_000_000.0), ("Pemberdayaan", 25_000_000.0)]
    );

    let per_row: Vec<f64> = series[1].points.iter().map(|p| p.value).collect();
    assert_eq!(per_row, vec![150_000_000.0, 25_000_000.0, 50_000_000.0]);

    // ad-hoc aggregation does not need a stored chart
    let adhoc = catalog
        .compute_aggregate(
            schema.id,
            &ChartDefinition::new(ChartType::Bar, "bidang", "Kegiatan per Bidang"),
        )
        .unwrap();
    assert_eq!(adhoc[0].label, "Pembangunan");
    assert_eq!(adhoc[0].value, 2.0);

    let err = catalog
        .compute_aggregate(
            schema.id,
            &ChartDefinition::new(ChartType::Pie, "kegiatan", "Teks"),
        )
        .unwrap_err();
    assert!(matches!(err, TableError::InvalidAggregation { .. }));

    // totals carry no grand total without row totals
    let totals = catalog.column_totals(schema.id).unwrap();
    assert_eq!(totals.grand_total, None);
    assert_eq!(totals.columns.len(), 1);
}

#[test]
fn test_schema_evolution_with_rows() {
    let catalog = Catalog::new();
    let schema = catalog.create_schema(budget_schema()).unwrap();
    let entry = catalog
        .insert_row(
            schema.id,
            row(json!({"bidang": "Pembinaan", "kegiatan": "Posyandu", "anggaran": 5_000_000})),
        )
        .unwrap();

    // adding an optional column fills existing rows with null
    let mut columns = schema.columns.clone();
    columns.push(ColumnDescriptor::new("keterangan", "Keterangan", ColumnType::Text));
    let updated = catalog
        .update_schema(
            schema.id,
            SchemaPatch {
                columns: Some(columns.clone()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.columns.len(), 5);
    assert_eq!(
        catalog.get_row(entry.id).unwrap().data.get("keterangan"),
        Some(&serde_json::Value::Null)
    );

    // a new required column cannot be satisfied by existing rows
    let mut required = columns.clone();
    required.push(ColumnDescriptor::new("sumber_dana", "Sumber Dana", ColumnType::Category).required());
    let err = catalog
        .update_schema(
            schema.id,
            SchemaPatch {
                columns: Some(required),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err, TableError::MissingRequiredColumn("sumber_dana".to_string()));
    assert_eq!(catalog.get_schema(schema.id).unwrap().columns.len(), 5);

    // removing the empty optional column succeeds
    let trimmed: Vec<_> = columns
        .into_iter()
        .filter(|c| c.key != "keterangan")
        .collect();
    catalog
        .update_schema(
            schema.id,
            SchemaPatch {
                columns: Some(trimmed),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(catalog
        .get_row(entry.id)
        .unwrap()
        .data
        .get("keterangan")
        .is_none());
}

#[test]
fn test_storage_name_lookup_and_reuse() -> anyhow::Result<()> {
    let catalog = Catalog::new();
    let first = catalog.create_schema(population_schema())?;
    assert_eq!(
        catalog.get_schema_by_storage_name("penduduk_dusun")?.id,
        first.id
    );

    catalog.delete_schema(first.id)?;
    assert!(matches!(
        catalog.get_schema_by_storage_name("penduduk_dusun"),
        Err(TableError::StorageNameNotFound { .. })
    ));

    let second = catalog.create_schema(population_schema())?;
    assert!(second.id > first.id);
    Ok(())
}
