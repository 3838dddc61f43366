//! Sweep scheduling

use crate::error::Result;
use image_disk_cache::{ImageCache, SweepReport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run one sweep on the blocking pool and log its outcome
pub async fn run_once(cache: Arc<ImageCache>) -> Result<SweepReport> {
    let report = tokio::task::spawn_blocking(move || cache.sweep()).await??;

    info!(
        scanned = report.scanned,
        stale_removed = report.stale_removed,
        evicted = report.evicted,
        temp_removed = report.temp_removed,
        bytes_freed = report.bytes_freed,
        size_after = report.size_after,
        failures = report.failures,
        "Sweep complete"
    );
    Ok(report)
}

/// Sweep every `interval` until Ctrl-C. A failed sweep is logged and retried on the next tick.
pub async fn run_periodic(cache: Arc<ImageCache>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal, stopping sweeper");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = run_once(Arc::clone(&cache)).await {
                    warn!(error = %e, "Sweep failed");
                }
            }
        }
    }
}
