//! Stale-entry removal and size-bounded eviction for the cache folder
//!
//! Lookups only detect staleness; this sweep is what actually reclaims disk.
//! It removes entries past the TTL, then, if the folder is still over
//! `max_size_bytes`, deletes the oldest entries (by mtime) until usage is at
//! 90% of the budget. Only files following the `{md5}.{ext}` naming scheme
//! are considered; anything else in the folder is left alone apart from
//! abandoned write temp files.

use crate::config::CacheConfig;
use crate::error::Result;
use crate::key::is_cache_file_name;
use crate::log::Logger;
use crate::store::{is_stale, TEMP_PREFIX};
use crate::{log_debug, log_info, log_warn};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Usage target after size eviction, as a fraction of `max_size_bytes`
const EVICTION_TARGET_PERCENTAGE: f64 = 0.9;

/// Temp files older than this are leftovers from interrupted writes
const TEMP_FILE_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Cache entries found in the folder
    pub scanned: usize,
    pub stale_removed: usize,
    /// Fresh entries deleted to get under the size budget
    pub evicted: usize,
    pub temp_removed: usize,
    pub bytes_freed: u64,
    pub size_before: u64,
    pub size_after: u64,
    /// Deletions that failed; the files stay and count towards `size_after`
    pub failures: usize,
}

struct CacheFile {
    path: PathBuf,
    modified: SystemTime,
    size: u64,
}

/// Sweep the cache folder described by `config`.
///
/// A missing folder is an empty cache. A disabled cache is not touched.
pub fn sweep(config: &CacheConfig, logger: &dyn Logger) -> Result<SweepReport> {
    let mut report = SweepReport::default();
    if !config.enabled {
        return Ok(report);
    }

    let (mut entries, temp_files) = match scan(&config.folder) {
        Ok(found) => found,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(e.into()),
    };

    report.scanned = entries.len();
    report.size_before = entries.iter().map(|e| e.size).sum();

    let now = Utc::now();
    entries.retain(|entry| {
        if !is_stale(entry.modified, now) {
            return true;
        }
        if remove_file(&entry.path, logger) {
            report.stale_removed += 1;
            report.bytes_freed += entry.size;
            false
        } else {
            report.failures += 1;
            true
        }
    });

    let mut remaining: u64 = entries.iter().map(|e| e.size).sum();
    if config.max_size_bytes > 0 && remaining > config.max_size_bytes {
        let target = (config.max_size_bytes as f64 * EVICTION_TARGET_PERCENTAGE) as u64;
        log_info!(
            logger,
            "Image cache over limit ({} > {} bytes), evicting down to {} bytes",
            remaining,
            config.max_size_bytes,
            target
        );

        entries.sort_by_key(|e| e.modified);
        for entry in &entries {
            if remaining <= target {
                break;
            }
            if remove_file(&entry.path, logger) {
                remaining = remaining.saturating_sub(entry.size);
                report.evicted += 1;
                report.bytes_freed += entry.size;
            } else {
                report.failures += 1;
            }
        }
    }
    report.size_after = remaining;

    let now = SystemTime::now();
    for temp in temp_files {
        let age = now.duration_since(temp.modified).unwrap_or_default();
        if age < TEMP_FILE_MAX_AGE {
            continue;
        }
        if remove_file(&temp.path, logger) {
            report.temp_removed += 1;
        } else {
            report.failures += 1;
        }
    }

    if report.failures > 0 {
        log_warn!(
            logger,
            "Image cache sweep could not delete {} files",
            report.failures
        );
    }
    if report.stale_removed + report.evicted + report.temp_removed > 0 {
        log_info!(
            logger,
            "Image cache sweep: {} stale, {} evicted, {} temp removed, {} bytes freed ({} -> {} bytes)",
            report.stale_removed,
            report.evicted,
            report.temp_removed,
            report.bytes_freed,
            report.size_before,
            report.size_after
        );
    }

    Ok(report)
}

/// List cache entries and write temp files directly inside `folder`
fn scan(folder: &Path) -> io::Result<(Vec<CacheFile>, Vec<CacheFile>)> {
    let mut entries = Vec::new();
    let mut temp_files = Vec::new();

    for dir_entry in fs::read_dir(folder)? {
        // Entries can vanish between listing and stat under concurrent writers
        let Ok(dir_entry) = dir_entry else { continue };
        let Ok(metadata) = dir_entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };

        let name = dir_entry.file_name();
        let Some(name) = name.to_str() else { continue };

        let file = CacheFile {
            path: dir_entry.path(),
            modified,
            size: metadata.len(),
        };
        if is_cache_file_name(name) {
            entries.push(file);
        } else if name.starts_with(TEMP_PREFIX) {
            temp_files.push(file);
        }
    }

    Ok((entries, temp_files))
}

fn remove_file(path: &Path, logger: &dyn Logger) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            log_debug!(logger, "Removed cache file {}", path.display());
            true
        }
        // Already gone counts as removed
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            log_debug!(
                logger,
                "Failed to delete cache file {}: {}",
                path.display(),
                e
            );
            false
        }
    }
}
