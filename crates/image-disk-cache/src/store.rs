//! Filesystem-backed get/put for rendered images
//!
//! Every call reads its truth from the cache folder; nothing about entries is
//! held in memory. Writes land in a temporary file inside the folder and are
//! renamed into place, so a concurrent reader sees either the old file or the
//! complete new one.

use crate::config::CacheConfig;
use crate::error::Result;
use crate::key::{derive_key, CacheKey};
use crate::log::{Logger, TracingLogger};
use crate::sweep::{self, SweepReport};
use crate::types::{CacheStats, CachedImage, Dimensions};
use crate::{log_debug, log_info};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Age in seconds after which a cached file is treated as absent (7 days)
pub const CACHE_TTL_SECS: i64 = 604_800;

/// Prefix of in-flight write files inside the cache folder
pub(crate) const TEMP_PREFIX: &str = ".tmp-render-";

/// Disk cache for rendered images
pub struct ImageCache {
    config: CacheConfig,
    logger: Arc<dyn Logger>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
}

impl ImageCache {
    /// Create a cache that logs through `tracing`
    pub fn new(config: CacheConfig) -> Self {
        Self::with_logger(config, Arc::new(TracingLogger))
    }

    pub fn with_logger(config: CacheConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            logger,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Ensure the cache folder exists
    pub fn init(&self) -> Result<()> {
        if !self.config.enabled {
            log_info!(self.logger, "Image cache disabled, skipping init");
            return Ok(());
        }
        fs::create_dir_all(&self.config.folder)?;
        log_info!(
            self.logger,
            "Image cache initialized at {}",
            self.config.folder.display()
        );
        Ok(())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Derive the on-disk key for a rendition in this cache's folder
    pub fn key_for(&self, path: &str, dims: Dimensions) -> Result<CacheKey> {
        derive_key(&self.config.folder, path, dims)
    }

    /// Look up a fresh rendition of `path` at `dims`.
    ///
    /// Returns `None` for malformed paths, absent or stale files, and any I/O
    /// error while reading. Stale files are left on disk.
    pub fn get(&self, path: &str, dims: Dimensions) -> Option<CachedImage> {
        if !self.config.enabled {
            return None;
        }

        let image = self.lookup(path, dims);
        if image.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        image
    }

    fn lookup(&self, path: &str, dims: Dimensions) -> Option<CachedImage> {
        let key = match self.key_for(path, dims) {
            Ok(key) => key,
            Err(e) => {
                log_debug!(self.logger, "Cache lookup skipped: {}", e);
                return None;
            }
        };

        let modified = fs::metadata(&key.path)
            .ok()
            .filter(|meta| meta.is_file())
            .and_then(|meta| meta.modified().ok())?;

        if is_stale(modified, Utc::now()) {
            log_debug!(self.logger, "Cache entry expired: {}", key.path.display());
            return None;
        }

        self.read_entry(&key)
    }

    fn read_entry(&self, key: &CacheKey) -> Option<CachedImage> {
        match fs::read(&key.path) {
            Ok(bytes) => Some(CachedImage {
                bytes,
                mime_type: mime_type_for(&key.extension),
            }),
            Err(e) => {
                log_debug!(
                    self.logger,
                    "Error while reading the file {}: {}",
                    key.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Store a rendition of `path` at `dims`, replacing any previous one.
    ///
    /// Failures are logged and swallowed.
    pub fn put(&self, path: &str, dims: Dimensions, bytes: &[u8]) {
        if !self.config.enabled {
            return;
        }

        let key = match self.key_for(path, dims) {
            Ok(key) => key,
            Err(e) => {
                log_debug!(self.logger, "Cache write skipped: {}", e);
                return;
            }
        };

        match write_atomic(&self.config.folder, &key.path, bytes) {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                log_debug!(
                    self.logger,
                    "Cached {} bytes at {}",
                    bytes.len(),
                    key.path.display()
                );
            }
            Err(e) => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                log_debug!(
                    self.logger,
                    "Error while writing the file {}: {}",
                    key.path.display(),
                    e
                );
            }
        }
    }

    /// Remove stale entries and evict down to the size budget
    pub fn sweep(&self) -> Result<SweepReport> {
        sweep::sweep(&self.config, self.logger.as_ref())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Whether a file last modified at `modified` has outlived the TTL at `now`.
///
/// Files with a modification time in the future are fresh. A modification
/// time outside the representable date range is stale.
pub(crate) fn is_stale(modified: SystemTime, now: DateTime<Utc>) -> bool {
    match to_datetime(modified) {
        Some(modified) => now - modified >= chrono::Duration::seconds(CACHE_TTL_SECS),
        None => true,
    }
}

fn to_datetime(time: SystemTime) -> Option<DateTime<Utc>> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => {
            DateTime::from_timestamp(i64::try_from(after.as_secs()).ok()?, after.subsec_nanos())
        }
        Err(e) => {
            let before = e.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => DateTime::from_timestamp(-secs, 0),
                nanos => DateTime::from_timestamp(-secs - 1, 1_000_000_000 - nanos),
            }
        }
    }
}

/// Content type for a cached file extension
pub fn mime_type_for(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn write_atomic(folder: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(folder)?;
    tmp.write_all(bytes)?;
    set_cache_permissions(tmp.path())?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_cache_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_cache_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
