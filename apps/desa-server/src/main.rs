//! REST API server for admin-defined data tables.
//!
//! Loads the snapshot, runs the tick runtime on its own thread, and serves the
//! HTTP API. On Ctrl+C it stops accepting connections, lets open requests
//! finish, then flushes the catalog.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use desa_tables_api::{router::Router, server::Server};
use desa_tables_core::{config::TablesConfig, persistence::PersistenceManager, TableError};
use desa_tables_runtime::{ApiRequest, Runtime};
use tokio::signal;
use tokio::sync::{mpsc, oneshot};

/// Command-line arguments for the table server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Tick rate for runtime loop (Hz)
    #[arg(long, default_value_t = 60)]
    tickrate: u32,

    /// Data directory for persistence
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 10000)]
    response_timeout_ms: u64,

    /// Ticks between snapshot flushes
    #[arg(long, default_value_t = 60)]
    persistence_interval_ticks: u32,
}

impl Args {
    fn config(&self) -> TablesConfig {
        TablesConfig {
            tickrate: self.tickrate,
            persistence_interval_ticks: self.persistence_interval_ticks,
            data_dir: self.data_dir.clone(),
            request_timeout_ms: self.request_timeout_ms,
            response_timeout_ms: self.response_timeout_ms,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = args.config();
    let persistence = Arc::new(PersistenceManager::new(&config));

    let catalog = match persistence.load_catalog() {
        Ok(catalog) => Arc::new(catalog),
        Err(TableError::DataCorruption(msg)) => {
            tracing::error!("Snapshot corruption detected: {}", msg);
            tracing::error!("Server cannot start. Restore the data directory from a backup.");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load snapshot"),
    };
    tracing::info!(
        "Loaded {} schemas from {}",
        catalog.schema_count()?,
        config.data_dir.display()
    );

    let (api_tx, api_rx) = mpsc::channel(1000);

    let mut runtime = Runtime::new(
        Arc::clone(&catalog),
        config.clone(),
        api_rx,
        Arc::clone(&persistence),
    );
    thread::spawn(move || {
        if let Err(e) = runtime.run() {
            tracing::error!("Runtime loop fatal error: {}", e);
            std::process::exit(1);
        }
    });

    let router = Router::new(Arc::new(config.clone()), api_tx.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let server = Server::new(addr, router);

    tracing::info!(
        "Starting table server on {} (tickrate {} Hz, data dir {})",
        addr,
        args.tickrate,
        args.data_dir.display()
    );

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutting down server..."),
            Err(e) => {
                tracing::error!("Failed to listen for ctrl_c, serving until killed: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    let drain_timeout = Duration::from_millis(config.response_timeout_ms);
    server
        .serve_with_shutdown(shutdown, drain_timeout)
        .await
        .context("Server error")?;

    flush_before_exit(&api_tx, config.response_timeout_ms).await
}

/// Asks the runtime to save the catalog and waits for it.
async fn flush_before_exit(
    api_tx: &mpsc::Sender<ApiRequest>,
    timeout_ms: u64,
) -> anyhow::Result<()> {
    let (response_tx, response_rx) = oneshot::channel();
    api_tx
        .send(ApiRequest::Flush {
            response: response_tx,
        })
        .await
        .context("Runtime stopped before the final flush")?;

    let reply = tokio::time::timeout(Duration::from_millis(timeout_ms), response_rx)
        .await
        .context("Timed out waiting for the final flush")?
        .context("Runtime dropped the final flush")?;
    let saved = reply?;
    tracing::info!("Final flush complete: {}", saved);
    Ok(())
}
