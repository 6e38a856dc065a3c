//! Block change notification.

use bitflags::bitflags;
use rgb_spatial::BlockPos;

use crate::Source;

bitflags! {
    /// Which parts of a cell a mutation wrote.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ChangeKind: u8 {
        const MATERIAL = 1 << 0;
        const DATA = 1 << 1;
        const BLOCK_LIGHT = 1 << 2;
        const SKY_LIGHT = 1 << 3;
        const CONTROLLER = 1 << 4;
    }
}

/// A successful write to the live generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockChange {
    pub pos: BlockPos,
    pub changed: ChangeKind,
    pub source: Source,
}

/// Receives every successful mutation made through an area.
///
/// Called on the mutating thread, right after the write, so it must be cheap
/// and thread-safe.
pub trait BlockChangeListener: Send + Sync + 'static {
    fn on_block_change(&self, change: &BlockChange);
}

// Implement BlockChangeListener for closures
impl<F> BlockChangeListener for F
where
    F: Fn(&BlockChange) + Send + Sync + 'static,
{
    fn on_block_change(&self, change: &BlockChange) {
        self(change);
    }
}
