//! Area configuration.
//!
//! ```toml
//! base = [-64, 0, -64]
//! size = [128, 128, 128]
//! queue_shards = 32
//! start_time = 0
//! ```
//!
//! Every key is optional; missing keys take the [`AreaConfig::default`] values.

use std::path::Path;

use rgb_spatial::{BlockPos, Cuboid};
use rgb_storage::StorageError;
use rgb_tick::{DEFAULT_SHARDS, TickTime};
use serde::Deserialize;

use crate::{AreaError, AreaResult};

/// Upper bound on update queue shards.
pub const MAX_QUEUE_SHARDS: usize = 1024;

/// Configuration for an [`AreaAccess`](crate::AreaAccess).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AreaConfig {
    /// Lowest corner of the area.
    pub base: [i32; 3],
    /// Extent on each axis.
    pub size: [u32; 3],
    /// Lock shards for the dynamic update queue.
    pub queue_shards: usize,
    /// Clock value before the first finalize.
    pub start_time: TickTime,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            base: [0, 0, 0],
            size: [16, 128, 16],
            queue_shards: DEFAULT_SHARDS,
            start_time: 0,
        }
    }
}

impl AreaConfig {
    /// Configuration covering `cuboid`, other settings default.
    #[must_use]
    pub fn for_cuboid(cuboid: Cuboid) -> Self {
        let base = cuboid.base();
        Self {
            base: [base.x, base.y, base.z],
            size: cuboid.size(),
            ..Self::default()
        }
    }

    /// Parse from TOML text.
    pub fn from_toml_str(text: &str) -> AreaResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> AreaResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The cuboid this configuration describes.
    #[must_use]
    pub fn cuboid(&self) -> Cuboid {
        let [x, y, z] = self.base;
        let [sx, sy, sz] = self.size;
        Cuboid::new(BlockPos::new(x, y, z), sx, sy, sz)
    }

    /// Reject shard counts outside `1..=MAX_QUEUE_SHARDS` and cuboids that are
    /// empty or reach past the block coordinate range.
    pub fn validate(&self) -> AreaResult<()> {
        if !(1..=MAX_QUEUE_SHARDS).contains(&self.queue_shards) {
            return Err(AreaError::InvalidShards(self.queue_shards));
        }

        let cuboid = self.cuboid();
        if cuboid.is_empty() {
            return Err(StorageError::EmptyVolume(cuboid).into());
        }
        if cuboid.max_corner().is_none() {
            return Err(StorageError::CoordinateOverflow(cuboid).into());
        }
        Ok(())
    }
}
