//! Block positions and dense cell indices.

use std::fmt;

/// Integer position of a single block in world space.
///
/// Ordering is lexicographic on `(x, y, z)`; it only exists so positions can
/// take part in ordered keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// The smallest representable position.
    pub const MIN: BlockPos = BlockPos {
        x: i32::MIN,
        y: i32::MIN,
        z: i32::MIN,
    };

    /// The origin.
    pub const ZERO: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position of the block containing a floating-point world coordinate.
    ///
    /// Coordinates are floored, so `-0.5` lands in block `-1`. Values outside
    /// the `i32` range saturate; NaN maps to `0`.
    #[must_use]
    pub fn from_f64(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }

    /// Offset by a delta on each axis (wrapping).
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
            z: self.z.wrapping_add(dz),
        }
    }

    /// The block directly above.
    #[must_use]
    pub const fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The block directly below.
    #[must_use]
    pub const fn down(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The six face-adjacent neighbors.
    #[must_use]
    pub const fn neighbors(self) -> [BlockPos; 6] {
        [
            self.offset(1, 0, 0),
            self.offset(-1, 0, 0),
            self.offset(0, 1, 0),
            self.offset(0, -1, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
        ]
    }
}

impl fmt::Debug for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

/// Dense index of a cell inside the partition that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellIndex(pub u32);

impl CellIndex {
    /// Index as a `usize`, for slice access.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_floors() {
        assert_eq!(BlockPos::from_f64(0.0, 0.0, 0.0), BlockPos::ZERO);
        assert_eq!(BlockPos::from_f64(15.9, 2.5, 0.1), BlockPos::new(15, 2, 0));
        assert_eq!(BlockPos::from_f64(-0.5, -1.0, -1.01), BlockPos::new(-1, -1, -2));
    }

    #[test]
    fn test_neighbors_are_distinct_and_adjacent() {
        let pos = BlockPos::new(4, 5, 6);
        let neighbors = pos.neighbors();

        for (i, a) in neighbors.iter().enumerate() {
            let distance = (a.x - pos.x).abs() + (a.y - pos.y).abs() + (a.z - pos.z).abs();
            assert_eq!(distance, 1, "{a:?} is not face-adjacent to {pos:?}");
            for b in &neighbors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_min_orders_first() {
        assert!(BlockPos::MIN < BlockPos::new(i32::MIN, i32::MIN, i32::MIN + 1));
        assert!(BlockPos::MIN < BlockPos::ZERO);
    }
}
