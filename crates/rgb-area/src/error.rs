//! Area error types.

use rgb_storage::StorageError;
use thiserror::Error;

/// Error building or configuring an area.
#[derive(Debug, Error)]
pub enum AreaError {
    /// The backing store rejected the cuboid.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Shard count outside `1..=MAX_QUEUE_SHARDS`.
    #[error("invalid queue shard count: {0}")]
    InvalidShards(usize),
}

/// Result type for area operations.
pub type AreaResult<T> = Result<T, AreaError>;

/// Error registering a block controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Every 24-bit controller id has been handed out.
    #[error("controller ids exhausted")]
    Exhausted,
}
