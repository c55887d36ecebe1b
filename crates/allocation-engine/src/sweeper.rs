//! Background worker for expiry sweeps
//!
//! The `ExpirySweeper` periodically asks the engine to transition overdue
//! pending orders to expired. The interval is injected configuration, not a
//! compiled constant.

use crate::engine::AllocationEngine;
use config::SweeperConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, instrument};

/// Background worker that runs expiry sweeps on a fixed interval
pub struct ExpirySweeper {
    engine: Arc<AllocationEngine>,
    config: SweeperConfig,
}

impl ExpirySweeper {
    /// Create a new sweeper over the given engine
    pub fn new(engine: Arc<AllocationEngine>, config: SweeperConfig) -> Self {
        Self { engine, config }
    }

    /// Run the worker. This blocks until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_seconds = self.config.interval_seconds,
            run_on_startup = self.config.run_on_startup,
            "Starting expiry sweeper"
        );

        if self.config.run_on_startup {
            self.run_cycle().await;
        }

        let interval = Duration::from_secs(self.config.interval_seconds);
        let mut timer = tokio::time::interval(interval);
        timer.tick().await; // immediate first tick already covered above

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Expiry sweeper shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Run a single sweep cycle against the current date
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) {
        let today = chrono::Utc::now().date_naive();
        match self.engine.sweep_expirations(today).await {
            Ok(expired) => {
                if expired > 0 {
                    info!(orders_expired = expired, "Sweep cycle complete");
                }
            }
            Err(e) => error!(error = %e, "Sweep cycle failed"),
        }
    }
}
