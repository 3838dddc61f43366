//! Error types for the image cache sweeper

use std::fmt;

#[derive(Debug)]
pub enum SweeperError {
    Cache(image_disk_cache::CacheError),
    Config(String),
    Task(String),
}

impl fmt::Display for SweeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweeperError::Cache(err) => write!(f, "Cache error: {}", err),
            SweeperError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SweeperError::Task(msg) => write!(f, "Sweep task failed: {}", msg),
        }
    }
}

impl std::error::Error for SweeperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweeperError::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<image_disk_cache::CacheError> for SweeperError {
    fn from(err: image_disk_cache::CacheError) -> Self {
        SweeperError::Cache(err)
    }
}

impl From<tokio::task::JoinError> for SweeperError {
    fn from(err: tokio::task::JoinError) -> Self {
        SweeperError::Task(err.to_string())
    }
}

impl From<tracing_subscriber::filter::ParseError> for SweeperError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        SweeperError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SweeperError>;
