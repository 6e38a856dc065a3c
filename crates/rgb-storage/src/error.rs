//! Storage error types.

use rgb_spatial::Cuboid;
use thiserror::Error;

/// Storage error type.
///
/// Only construction can fail; bounds misses and CAS mismatches on a live
/// store are reported through `bool` / `Option` returns instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The cuboid has a zero extent on some axis.
    #[error("{0} contains no cells")]
    EmptyVolume(Cuboid),

    /// Part of the cuboid lies past `i32::MAX` and can not be addressed.
    #[error("{0} extends past the block coordinate range")]
    CoordinateOverflow(Cuboid),

    /// The cuboid holds more cells than a `CellIndex` can address.
    #[error("{cuboid} has {volume} cells, more than a store can address")]
    VolumeTooLarge {
        /// The rejected cuboid.
        cuboid: Cuboid,
        /// Its volume in cells.
        volume: u64,
    },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
