//! Axis-aligned cuboid partitions.

use std::fmt;

use crate::{BlockPos, CellIndex};

/// A box of blocks located somewhere in the world.
///
/// A cuboid is the unit of ownership for a block store: every position inside
/// it maps to exactly one dense [`CellIndex`], laid out Y-major so a
/// horizontal layer is contiguous:
///
/// ```text
/// index = (dy * size_z + dz) * size_x + dx
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cuboid {
    /// Lowest corner (inclusive).
    base: BlockPos,
    /// Extent along X.
    size_x: u32,
    /// Extent along Y.
    size_y: u32,
    /// Extent along Z.
    size_z: u32,
}

impl Cuboid {
    /// Create a cuboid from its lowest corner and its extent on each axis.
    #[must_use]
    pub const fn new(base: BlockPos, size_x: u32, size_y: u32, size_z: u32) -> Self {
        Self {
            base,
            size_x,
            size_y,
            size_z,
        }
    }

    /// A cube of side `size` anchored at `base`.
    #[must_use]
    pub const fn cube(base: BlockPos, size: u32) -> Self {
        Self::new(base, size, size, size)
    }

    /// Lowest corner (inclusive).
    #[must_use]
    pub const fn base(&self) -> BlockPos {
        self.base
    }

    /// Extent on each axis.
    #[must_use]
    pub const fn size(&self) -> [u32; 3] {
        [self.size_x, self.size_y, self.size_z]
    }

    /// Number of blocks in the cuboid.
    #[must_use]
    pub const fn volume(&self) -> u64 {
        self.size_x as u64 * self.size_y as u64 * self.size_z as u64
    }

    /// Check if the cuboid contains no blocks.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Highest corner (inclusive).
    ///
    /// `None` when the cuboid is empty or reaches past `i32::MAX` on some axis,
    /// in which case part of it has no [`BlockPos`].
    #[must_use]
    pub fn max_corner(&self) -> Option<BlockPos> {
        let axis = |base: i32, size: u32| {
            if size == 0 {
                return None;
            }
            i32::try_from(i64::from(base) + i64::from(size) - 1).ok()
        };

        Some(BlockPos::new(
            axis(self.base.x, self.size_x)?,
            axis(self.base.y, self.size_y)?,
            axis(self.base.z, self.size_z)?,
        ))
    }

    /// Check if a position lies inside the cuboid.
    #[must_use]
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.local(pos).is_some()
    }

    /// Resolve a world position to its owning cell.
    ///
    /// Returns `None` when the position is outside the cuboid.
    #[must_use]
    pub fn resolve(&self, pos: BlockPos) -> Option<CellIndex> {
        let (dx, dy, dz) = self.local(pos)?;
        let index = (dy * u64::from(self.size_z) + dz) * u64::from(self.size_x) + dx;
        u32::try_from(index).ok().map(CellIndex)
    }

    /// World position of a cell index. Inverse of [`Cuboid::resolve`].
    #[must_use]
    pub fn pos_of(&self, index: CellIndex) -> Option<BlockPos> {
        let index = u64::from(index.0);
        if index >= self.volume() {
            return None;
        }

        let sx = u64::from(self.size_x);
        let sz = u64::from(self.size_z);
        let dx = index % sx;
        let dz = (index / sx) % sz;
        let dy = index / (sx * sz);

        let coord = |base: i32, d: u64| i32::try_from(i64::from(base) + d as i64).ok();
        Some(BlockPos::new(
            coord(self.base.x, dx)?,
            coord(self.base.y, dy)?,
            coord(self.base.z, dz)?,
        ))
    }

    /// Iterate over every position in index order.
    ///
    /// Cells past `i32::MAX` have no position and are skipped.
    pub fn iter(&self) -> impl Iterator<Item = BlockPos> + '_ {
        (0..self.volume()).filter_map(move |i| {
            u32::try_from(i)
                .ok()
                .and_then(|i| self.pos_of(CellIndex(i)))
        })
    }

    /// Offset of `pos` from the base, if inside.
    fn local(&self, pos: BlockPos) -> Option<(u64, u64, u64)> {
        let axis = |p: i32, base: i32, size: u32| {
            let d = i64::from(p) - i64::from(base);
            (0..i64::from(size)).contains(&d).then_some(d as u64)
        };

        Some((
            axis(pos.x, self.base.x, self.size_x)?,
            axis(pos.y, self.base.y, self.size_y)?,
            axis(pos.z, self.base.z, self.size_z)?,
        ))
    }
}

impl fmt::Debug for Cuboid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Cuboid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cuboid[{}, {}, {}]@[{}]",
            self.size_x, self.size_y, self.size_z, self.base
        )
    }
}
