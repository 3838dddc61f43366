//! Disk-backed image response cache
//!
//! Stores rendered image bytes on the local filesystem, keyed by the source
//! image path and the requested output dimensions, so repeated requests for
//! the same rendition skip the resize pipeline.
//!
//! Lookups and writes are best-effort: failures degrade to a cache miss or an
//! un-cached write and never surface to the caller. Entries older than
//! [`CACHE_TTL_SECS`] are treated as absent and are removed by [`sweep`], which
//! also enforces the configured size budget.

pub mod config;
pub mod error;
pub mod key;
pub mod log;
pub mod store;
pub mod sweep;
pub mod types;

pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use key::{derive_key, CacheKey};
pub use log::{LogLevel, Logger, NoOpLogger, TracingLogger};
pub use store::{mime_type_for, ImageCache, CACHE_TTL_SECS};
pub use sweep::{sweep, SweepReport};
pub use types::{CacheStats, CachedImage, Dimensions};
