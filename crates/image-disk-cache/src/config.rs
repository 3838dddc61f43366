//! Cache configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

const DEFAULT_FOLDER: &str = "./cache/images";
const DEFAULT_MAX_SIZE: u64 = 1024 * 1024 * 1024; // 1GB

/// Configuration for the image disk cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false, lookups always miss and writes are skipped
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Flat directory holding `{md5}.{ext}` files
    #[serde(default = "default_folder")]
    pub folder: PathBuf,
    /// Size budget enforced by the sweep; 0 disables size-based eviction
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_folder() -> PathBuf {
    PathBuf::from(DEFAULT_FOLDER)
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            folder: default_folder(),
            max_size_bytes: default_max_size(),
        }
    }
}

impl CacheConfig {
    /// Parse configuration from `CACHE_ENABLED`, `CACHE_FOLDER` and `CACHE_MAX_SIZE`
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Parse configuration using an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("CACHE_ENABLED")
            .and_then(|v| parse_bool(&v))
            .unwrap_or_else(default_enabled);

        let folder = lookup("CACHE_FOLDER")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_folder);

        let max_size_bytes = lookup("CACHE_MAX_SIZE")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_SIZE);

        Self {
            enabled,
            folder,
            max_size_bytes,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
