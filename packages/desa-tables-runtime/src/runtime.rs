//! Runtime loop with tick phases and timing enforcement.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use desa_tables_core::config::TablesConfig;
use desa_tables_core::persistence::PersistenceManager;
use desa_tables_core::Catalog;
use tokio::sync::mpsc;

use crate::api_handlers::ApiHandlers;
use crate::api_request::ApiRequest;
use crate::Result;

/// Share of each tick available to API request processing; the rest is left
/// for the persistence phase and sleep.
const API_PHASE_SHARE: f32 = 0.8;

/// Main runtime loop
pub struct Runtime {
    /// Catalog instance
    catalog: Arc<Catalog>,
    /// Configuration
    config: TablesConfig,
    /// Tick duration
    tick_duration: Duration,
    /// API request receiver
    api_rx: mpsc::Receiver<ApiRequest>,
    /// Schema request queue (higher priority)
    ddl_queue: VecDeque<ApiRequest>,
    /// Row request queue (lower priority)
    dml_queue: VecDeque<ApiRequest>,
    /// Persistence manager flushed during the persistence phase
    persistence: Arc<PersistenceManager>,
    /// API requests processed in current tick
    api_requests_processed_this_tick: AtomicU32,
    /// Total dropped requests due to a full queue
    dropped_requests: AtomicU64,
    /// Maximum queue capacity (tickrate * 100)
    queue_capacity: usize,
    /// Current tick count
    tick_count: u64,
    /// API handlers
    api_handlers: ApiHandlers,
}

impl Runtime {
    /// Create a new runtime
    pub fn new(
        catalog: Arc<Catalog>,
        config: TablesConfig,
        api_rx: mpsc::Receiver<ApiRequest>,
        persistence: Arc<PersistenceManager>,
    ) -> Self {
        let tickrate = config.tickrate.max(1);
        let tick_duration = Duration::from_secs_f64(1.0 / tickrate as f64);
        let queue_capacity = tickrate as usize * 100;
        let api_handlers =
            ApiHandlers::new(Arc::clone(&catalog), config.clone(), Arc::clone(&persistence));

        Self {
            catalog,
            config,
            tick_duration,
            api_rx,
            ddl_queue: VecDeque::new(),
            dml_queue: VecDeque::new(),
            persistence,
            api_requests_processed_this_tick: AtomicU32::new(0),
            dropped_requests: AtomicU64::new(0),
            queue_capacity,
            tick_count: 0,
            api_handlers,
        }
    }

    /// Get queue sizes for testing
    pub fn queue_sizes(&self) -> (usize, usize) {
        (self.ddl_queue.len(), self.dml_queue.len())
    }

    /// Total requests dropped because the queues were full.
    pub fn dropped_requests(&self) -> u64 {
        self.dropped_requests.load(Ordering::Relaxed)
    }

    /// Requests processed during the last tick.
    pub fn processed_last_tick(&self) -> u32 {
        self.api_requests_processed_this_tick.load(Ordering::Relaxed)
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    fn queued(&self) -> usize {
        self.ddl_queue.len() + self.dml_queue.len()
    }

    /// Drain API channel into priority queues, respecting capacity.
    fn drain_api_channel(&mut self) {
        while let Ok(req) = self.api_rx.try_recv() {
            if self.queued() >= self.queue_capacity {
                // Dropping the request drops its sender, so the caller sees a closed channel.
                let dropped = self.dropped_requests.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!("Request queue full, dropped {} requests so far", dropped);
                continue;
            }
            if req.is_ddl() {
                self.ddl_queue.push_back(req);
            } else {
                self.dml_queue.push_back(req);
            }
        }
    }

    /// Process queued API requests up to limit and time budget.
    fn process_queued_requests(&mut self, tick_start: Instant, time_budget: Duration) -> Result<()> {
        let max_requests = self.config.max_api_requests_per_tick;
        let mut processed = 0;

        while processed < max_requests {
            if tick_start.elapsed() > time_budget {
                break;
            }
            let Some(req) = self
                .ddl_queue
                .pop_front()
                .or_else(|| self.dml_queue.pop_front())
            else {
                break;
            };
            self.api_handlers.handle_api_request(req)?;
            processed += 1;
        }

        self.api_requests_processed_this_tick
            .store(processed, Ordering::Relaxed);
        Ok(())
    }

    /// Execute a single tick of the runtime
    pub fn tick(&mut self) -> Result<()> {
        let tick_start = Instant::now();

        // Phase 1: API requests
        self.process_api_phase(tick_start)?;

        // Phase 2: Persistence
        self.process_persistence_phase()?;

        // Sleep remainder of tick
        self.sleep_remaining(tick_start);

        self.tick_count += 1;
        Ok(())
    }

    /// Run the runtime loop until every API sender is gone.
    ///
    /// Pending changes are flushed before returning.
    pub fn run(&mut self) -> Result<()> {
        while !(self.api_rx.is_closed() && self.api_rx.is_empty() && self.queued() == 0) {
            self.tick()?;
        }
        tracing::info!("Request channel closed after {} ticks", self.tick_count);
        self.persistence.flush_if_dirty(&self.catalog)?;
        Ok(())
    }

    /// Process API phase
    pub fn process_api_phase(&mut self, tick_start: Instant) -> Result<()> {
        let api_time_budget = self.tick_duration.mul_f32(API_PHASE_SHARE);

        self.drain_api_channel();
        self.process_queued_requests(tick_start, api_time_budget)?;

        Ok(())
    }

    /// Process persistence phase
    ///
    /// Flush failures are logged and retried on the next interval; the
    /// in-memory catalog stays authoritative.
    pub fn process_persistence_phase(&mut self) -> Result<()> {
        match self.persistence.tick(&self.catalog) {
            Ok(true) => tracing::debug!("Flushed catalog at tick {}", self.tick_count),
            Ok(false) => {}
            Err(e) => tracing::error!("Persistence flush failed: {}", e),
        }
        Ok(())
    }

    /// Sleep remaining tick time
    fn sleep_remaining(&self, tick_start: Instant) {
        if let Some(remaining) = self.tick_duration.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}
