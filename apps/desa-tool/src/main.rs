//! CLI tool for snapshot inspection and verification.
//!
//! Reads the data directory written by the server without starting it:
//! - list schemas
//! - page through rows, totals, and chart series of one table
//! - verify checksums and row validity

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use desa_tables_core::config::TablesConfig;
use desa_tables_core::persistence::PersistenceManager;
use desa_tables_core::Catalog;

/// Command-line arguments for the table tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory to read
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all schemas
    Schemas,
    /// Show one page of a table's rows
    Rows {
        storage_name: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Compute every chart stored on a table
    Charts { storage_name: String },
    /// Column sums and grand total of a table
    Totals { storage_name: String },
    /// Load and validate the snapshot, then report counts
    Verify,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let output = run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<Value> {
    let config = TablesConfig {
        data_dir: cli.data_dir.clone(),
        ..Default::default()
    };
    let persistence = PersistenceManager::new(&config);
    let catalog = persistence
        .load_catalog()
        .with_context(|| format!("Failed to load snapshot from {}", cli.data_dir.display()))?;

    let output = match &cli.command {
        Command::Schemas => serde_json::to_value(catalog.list_schemas()?)?,
        Command::Rows {
            storage_name,
            page,
            page_size,
        } => {
            let schema_id = schema_id(&catalog, storage_name)?;
            let page = catalog.list_rows(
                schema_id,
                *page,
                page_size.unwrap_or(config.default_page_size),
                config.max_page_size,
            )?;
            serde_json::to_value(page)?
        }
        Command::Charts { storage_name } => {
            let schema_id = schema_id(&catalog, storage_name)?;
            serde_json::to_value(catalog.chart_series(schema_id)?)?
        }
        Command::Totals { storage_name } => {
            let schema_id = schema_id(&catalog, storage_name)?;
            serde_json::to_value(catalog.column_totals(schema_id)?)?
        }
        Command::Verify => verify_report(&catalog)?,
    };
    Ok(output)
}

fn schema_id(catalog: &Catalog, storage_name: &str) -> anyhow::Result<u64> {
    Ok(catalog.get_schema_by_storage_name(storage_name)?.id)
}

/// Counts per table of a snapshot that loaded cleanly.
fn verify_report(catalog: &Catalog) -> anyhow::Result<Value> {
    let mut tables = Vec::new();
    let mut total_rows = 0;
    for schema in catalog.list_schemas()? {
        let rows = catalog.row_count(schema.id)?;
        total_rows += rows;
        tables.push(json!({
            "id": schema.id,
            "storageName": schema.storage_name,
            "rows": rows,
        }));
    }
    tracing::info!("Snapshot OK: {} tables, {} rows", tables.len(), total_rows);
    Ok(json!({
        "ok": true,
        "schemas": tables.len(),
        "rows": total_rows,
        "tables": tables,
    }))
}
