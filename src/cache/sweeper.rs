//! Background purge of expired cache entries.
//!
//! # Responsibilities
//! - Periodically drop expired entries so idle keys do not accumulate
//! - Report cache sizes after each pass
//!
//! Lookups already ignore expired entries; this task only bounds memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::cache::expiring::Sweep;
use crate::observability::metrics;

pub struct CacheSweeper {
    caches: Vec<Arc<dyn Sweep>>,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(caches: Vec<Arc<dyn Sweep>>, interval: Duration) -> Self {
        Self { caches, interval }
    }

    /// Run one purge pass over every cache. Returns the number of entries removed.
    pub fn sweep_once(&self) -> usize {
        let mut removed = 0;
        for cache in &self.caches {
            let purged = cache.purge_expired();
            let remaining = cache.len();
            metrics::record_cache_size(cache.name(), remaining);
            if purged > 0 {
                tracing::debug!(cache = cache.name(), purged, remaining, "Purged expired entries");
            }
            removed += purged;
        }
        removed
    }

    /// Sweep on an interval until shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            caches = self.caches.len(),
            "Cache sweeper starting"
        );

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; nothing is stale yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
