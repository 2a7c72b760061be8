//! Background Expiry Sweeper
//!
//! Lazy expiry only reclaims a key when something touches it again; a key
//! that expires and is never read would otherwise sit in memory forever.
//! The sweeper closes that gap: a background task that walks every
//! registered database, one shard at a time, purging expired entries.
//!
//! The sweeper is strictly an optimization. Correctness never depends on
//! it — every read/write path performs its own expiry check — so all
//! engine tests pass with the sweeper disabled.
//!
//! Each shard is purged under its own brief lock and the task yields
//! between shards, so client traffic is never starved. The sweep interval
//! adapts: when a large fraction of keys turn out to be expired the
//! sweeper speeds up, and it backs off while there is nothing to reclaim.

use crate::storage::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Starting interval between sweeps.
    pub base_interval: Duration,
    /// Lower bound for the adaptive interval.
    pub min_interval: Duration,
    /// Upper bound for the adaptive interval.
    pub max_interval: Duration,
    /// Speed up when more than this fraction of keys expired this sweep.
    pub speedup_threshold: f64,
    /// Slow down when less than this fraction of keys expired this sweep.
    pub slowdown_threshold: f64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_secs(1),
            speedup_threshold: 0.25,
            slowdown_threshold: 0.01,
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// Dropping the handle stops the background task.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the sweeper over all databases in the registry.
    pub fn start(registry: Arc<Registry>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(sweeper_loop(registry, config, shutdown_rx));
        info!("background expiry sweeper started");
        Self { shutdown_tx }
    }

    /// Stops the sweeper. Called automatically on drop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    registry: Arc<Registry>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut current_interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(current_interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let mut keys_before = 0u64;
        let mut expired = 0u64;

        // The database list is re-read every sweep so databases created or
        // loaded since the last pass are covered too.
        for db in registry.databases() {
            keys_before += db.size() as u64;
            for idx in 0..db.shard_count() {
                expired += db.purge_expired_shard(idx);
                // One shard lock at a time; let client tasks in between.
                tokio::task::yield_now().await;
            }
        }

        if keys_before > 0 {
            let expiry_rate = expired as f64 / keys_before as f64;
            if expiry_rate > config.speedup_threshold {
                current_interval = (current_interval / 2).max(config.min_interval);
                debug!(
                    expired,
                    rate = %format!("{:.2}%", expiry_rate * 100.0),
                    new_interval_ms = current_interval.as_millis(),
                    "high expiry rate, speeding up sweeper"
                );
            } else if expiry_rate < config.slowdown_threshold && expired == 0 {
                current_interval = (current_interval * 2).min(config.max_interval);
                trace!(
                    new_interval_ms = current_interval.as_millis(),
                    "low expiry rate, slowing down sweeper"
                );
            }
        }

        if expired > 0 {
            debug!(expired, "expired keys reclaimed by sweeper");
        }
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper(registry: Arc<Registry>) -> ExpirySweeper {
    ExpirySweeper::start(registry, ExpiryConfig::default())
}
