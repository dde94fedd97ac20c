//! Table store configuration.

use std::path::PathBuf;

/// Table store configuration.
#[derive(Debug, Clone)]
pub struct TablesConfig {
    /// Tick rate in Hz (15-120)
    pub tickrate: u32,
    /// Persistence interval in ticks
    pub persistence_interval_ticks: u32,
    /// Maximum API requests per tick
    pub max_api_requests_per_tick: u32,
    /// Data directory for persistence
    pub data_dir: PathBuf,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Response timeout in milliseconds
    pub response_timeout_ms: u64,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
    /// Page size used when a listing request does not name one
    pub default_page_size: usize,
    /// Upper bound for requested page sizes
    pub max_page_size: usize,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            tickrate: 60,
            persistence_interval_ticks: 60,
            max_api_requests_per_tick: 600,
            data_dir: PathBuf::from("./data"),
            request_timeout_ms: 5000,
            response_timeout_ms: 10000,
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
            default_page_size: 20,
            max_page_size: 500,
        }
    }
}
