//! RGB Spatial Partitioning
//!
//! Integer block coordinates and the cuboid partitions that own them.
//! A [`Cuboid`] resolves a [`BlockPos`] to the dense [`CellIndex`] used by the
//! block store, or reports that the position lies outside the partition.

pub mod cuboid;
pub mod pos;

pub use cuboid::Cuboid;
pub use pos::{BlockPos, CellIndex};
