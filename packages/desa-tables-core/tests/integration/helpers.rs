//! Shared fixtures for integration tests.

use serde_json::Value;

use desa_tables_core::row::RowData;
use desa_tables_core::schema::{ChartDefinition, ChartType, ColumnDescriptor, ColumnType, NewSchema};

/// Converts a JSON object literal into row data.
pub fn row(value: Value) -> RowData {
    value
        .as_object()
        .cloned()
        .expect("row literal must be an object")
}

/// Population per hamlet, with row totals and a bar chart per hamlet.
pub fn population_schema() -> NewSchema {
    NewSchema::new(
        "Penduduk per Dusun",
        "penduduk_dusun",
        vec![
            ColumnDescriptor::new("dusun", "Dusun", ColumnType::Category).required(),
            ColumnDescriptor::new("jumlah_l", "Laki-laki", ColumnType::Number).required(),
            ColumnDescriptor::new("jumlah_p", "Perempuan", ColumnType::Number).required(),
        ],
    )
    .with_row_total()
    .with_charts(vec![ChartDefinition::new(
        ChartType::Bar,
        "dusun",
        "Jumlah RT per Dusun",
    )])
}

/// Village budget lines grouped by sector.
pub fn budget_schema() -> NewSchema {
    NewSchema::new(
        "APBDes",
        "apbdes",
        vec![
            ColumnDescriptor::new("bidang", "Bidang", ColumnType::Category).required(),
            ColumnDescriptor::new("kegiatan", "Kegiatan", ColumnType::Text).required(),
            ColumnDescriptor::new("anggaran", "Anggaran", ColumnType::Number).required(),
            ColumnDescriptor::new("tanggal", "Tanggal", ColumnType::Date),
        ],
    )
    .with_description("Anggaran pendapatan dan belanja desa")
    .with_charts(vec![
        ChartDefinition::new(ChartType::Pie, "anggaran", "Anggaran per Bidang").grouped_by("bidang"),
        ChartDefinition::new(ChartType::Line, "anggaran", "Anggaran per Kegiatan"),
    ])
}
