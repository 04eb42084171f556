//! Scheduled cleanup of expired temporary files.

use crate::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Default sweep cadence.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Runs the expired-file sweep on a schedule. Concurrent sweeps (e.g. in a
/// multi-process deployment) are harmless: backend deletes are idempotent
/// and metadata deletion of an already-deleted id is a no-op.
pub struct CleanupService {
    engine: Arc<StorageEngine>,
    period: Duration,
}

impl CleanupService {
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self {
            engine,
            period: CLEANUP_INTERVAL,
        }
    }

    /// Override the sweep cadence (tests, aggressive deployments).
    pub fn with_period(engine: Arc<StorageEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Start the background cleanup task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut cleanup_interval = interval(self.period);

            loop {
                cleanup_interval.tick().await;

                tracing::info!("Starting scheduled cleanup of expired temporary files");

                match self.engine.cleanup_temp_files().await {
                    Ok(removed) => {
                        tracing::info!(removed, "Cleanup task completed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Cleanup task failed");
                    }
                }
            }
        })
    }
}
