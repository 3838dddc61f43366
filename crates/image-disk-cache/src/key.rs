//! Cache key derivation
//!
//! A rendition is identified by the second-to-last `.`-separated segment of
//! its source path plus the requested dimensions. The file name on disk is
//! `{md5("{base}_{width}_{height}")}.{extension}`, so external tooling can
//! recompute it without reading anything from the cache.
//!
//! Only the segment immediately before the extension takes part in the hash:
//! `a.b.jpg` and `z.b.jpg` share a key. Directory components before that
//! segment are ignored as well.

use crate::error::{CacheError, Result};
use crate::types::Dimensions;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};

/// Length of the hex-encoded digest prefix of every cache file name
pub const DIGEST_HEX_LEN: usize = 32;

/// Derived location of one cached rendition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    /// Hex-encoded MD5 digest of `{base}_{width}_{height}`
    pub hash_hex: String,
    /// Extension of the source path, without the dot
    pub extension: String,
    /// `{hash_hex}.{extension}`
    pub file_name: String,
    /// `file_name` inside the cache folder
    pub path: PathBuf,
}

/// Derive the cache key for `path` rendered at `dims`, located in `folder`.
///
/// Fails with [`CacheError::MalformedPath`] when `path` has no `.` or when
/// the extension would escape the cache folder.
pub fn derive_key(folder: &Path, path: &str, dims: Dimensions) -> Result<CacheKey> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.len() < 2 {
        return Err(CacheError::MalformedPath(path.to_string()));
    }

    let extension = segments[segments.len() - 1];
    let base_name = segments[segments.len() - 2];

    if extension.contains(['/', '\\']) {
        return Err(CacheError::MalformedPath(path.to_string()));
    }

    let hash_hex = digest_hex(base_name, dims);
    let file_name = format!("{}.{}", hash_hex, extension);

    Ok(CacheKey {
        path: folder.join(&file_name),
        extension: extension.to_string(),
        hash_hex,
        file_name,
    })
}

fn digest_hex(base_name: &str, dims: Dimensions) -> String {
    let input = format!("{}_{}_{}", base_name, dims.width, dims.height);
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Whether `file_name` follows the `{32 hex}.{ext}` cache naming scheme
pub fn is_cache_file_name(file_name: &str) -> bool {
    match file_name.split_once('.') {
        Some((digest, _)) => {
            digest.len() == DIGEST_HEX_LEN
                && digest
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        }
        None => false,
    }
}
