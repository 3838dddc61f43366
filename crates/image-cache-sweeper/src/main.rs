//! Image cache sweeper
//!
//! Removes expired renditions from the image disk cache and evicts the
//! oldest ones when the folder exceeds its size budget. Runs once by default;
//! set `SWEEP_INTERVAL_SECS` to keep it running as a daemon.

mod error;
mod sweeper;

use crate::error::Result;
use image_disk_cache::{CacheConfig, ImageCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("image_cache_sweeper=info".parse()?)
        .add_directive("image_disk_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting image cache sweeper...");

    let config = CacheConfig::from_env();
    let interval_secs = parse_interval(std::env::var("SWEEP_INTERVAL_SECS").ok());
    info!("Cache enabled: {}", config.enabled);
    info!("Cache folder: {:?}", config.folder);
    info!(
        "Max cache size: {} MB",
        config.max_size_bytes / (1024 * 1024)
    );

    let cache = Arc::new(ImageCache::new(config));
    cache.init()?;

    if interval_secs == 0 {
        let report = sweeper::run_once(cache).await?;
        if let Ok(json) = serde_json::to_string(&report) {
            println!("{}", json);
        }
        return Ok(());
    }

    info!("Sweep interval: {} seconds", interval_secs);
    sweeper::run_periodic(cache, Duration::from_secs(interval_secs)).await;

    Ok(())
}

/// Interval between sweeps; 0 (or unset/invalid) means run once
fn parse_interval(value: Option<String>) -> u64 {
    value.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}
