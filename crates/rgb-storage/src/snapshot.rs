//! Snapshot / live double-generation store.
//!
//! # Tick Model
//!
//! ```text
//! simulate (many threads, &self)        finalize (one thread, &mut self)
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │ read_snapshot ─► snapshot[]  │      │ for i in touched:            │
//! │ read_live     ─► live[]      │ ───► │   snapshot[i] = live[i]      │
//! │ write_live    ─► live[] + i  │      │   clear dirty bit            │
//! │ CAS / fields  ─► live[] + i  │      │ generation += 1              │
//! └──────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! Snapshot reads take no lock and never observe a write from the current
//! tick. `finalize_tick` takes `&mut self`, so it cannot run while any
//! simulate-phase borrow is alive.

use core::sync::atomic::{AtomicU64, Ordering};

use rgb_spatial::{BlockPos, CellIndex, Cuboid};
use tracing::{debug, trace};

use crate::{
    BitField, CellWord, StorageError, StorageResult,
    buffer::TouchedBuffers,
};

/// Tick-synchronized storage for every cell of one cuboid.
pub struct SnapshotStore {
    /// The partition this store backs.
    cuboid: Cuboid,
    /// Live generation, one atomic word per cell.
    live: Box<[AtomicU64]>,
    /// Snapshot generation, frozen between finalizes.
    snapshot: Box<[CellWord]>,
    /// One bit per cell, set on the first write of a tick.
    dirty: Box<[AtomicU64]>,
    /// Cells whose dirty bit was set this tick.
    touched: TouchedBuffers,
    /// Completed finalize count.
    generation: u64,
}

impl SnapshotStore {
    /// Create a store for every cell of `cuboid`, all [`CellWord::EMPTY`].
    pub fn new(cuboid: Cuboid) -> StorageResult<Self> {
        let volume = cuboid.volume();
        if volume == 0 {
            return Err(StorageError::EmptyVolume(cuboid));
        }
        if volume > u64::from(u32::MAX) {
            return Err(StorageError::VolumeTooLarge { cuboid, volume });
        }
        if cuboid.max_corner().is_none() {
            return Err(StorageError::CoordinateOverflow(cuboid));
        }

        let cells = volume as usize;
        debug!(%cuboid, cells, "created snapshot store");

        Ok(Self {
            cuboid,
            live: (0..cells).map(|_| AtomicU64::new(0)).collect(),
            snapshot: vec![CellWord::EMPTY; cells].into_boxed_slice(),
            dirty: (0..cells.div_ceil(64)).map(|_| AtomicU64::new(0)).collect(),
            touched: TouchedBuffers::new(),
            generation: 0,
        })
    }

    /// The partition this store backs.
    #[must_use]
    pub const fn cuboid(&self) -> &Cuboid {
        &self.cuboid
    }

    /// Check if a position is addressable by this store.
    #[must_use]
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.cuboid.contains(pos)
    }

    /// Number of completed finalizes.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    // ==================== Reads ====================

    /// Read the state as of the most recent finalize.
    ///
    /// Never blocks and never reflects writes made during the current tick.
    /// Returns [`CellWord::EMPTY`] for out-of-bounds positions.
    #[inline]
    #[must_use]
    pub fn read_snapshot(&self, pos: BlockPos) -> CellWord {
        self.cuboid
            .resolve(pos)
            .map_or(CellWord::EMPTY, |index| self.snapshot[index.get()])
    }

    /// Read the in-progress state, including writes from other threads.
    ///
    /// Best-effort: the result depends on how concurrent writers interleave,
    /// so it must not drive decisions that need to be deterministic.
    /// Returns [`CellWord::EMPTY`] for out-of-bounds positions.
    #[inline]
    #[must_use]
    pub fn read_live(&self, pos: BlockPos) -> CellWord {
        self.cuboid.resolve(pos).map_or(CellWord::EMPTY, |index| {
            CellWord::from_bits(self.live[index.get()].load(Ordering::Acquire))
        })
    }

    /// Read one field of the live data word.
    #[must_use]
    pub fn get_bit_field(&self, pos: BlockPos, field: BitField) -> Option<u16> {
        self.cuboid
            .resolve(pos)
            .map(|index| field.get(self.live_word(index).data()))
    }

    // ==================== Writes ====================

    /// Replace the whole live word. Returns `false` if out of bounds.
    pub fn write_live(&self, pos: BlockPos, word: CellWord) -> bool {
        let Some(index) = self.cuboid.resolve(pos) else {
            trace!(?pos, "write_live out of bounds");
            return false;
        };

        self.live[index.get()].store(word.to_bits(), Ordering::Release);
        self.touch(index);
        true
    }

    /// Atomically apply `f` to the live word, returning the previous word.
    ///
    /// `f` may run more than once under contention and must be pure.
    pub fn update_live<F>(&self, pos: BlockPos, mut f: F) -> Option<CellWord>
    where
        F: FnMut(CellWord) -> CellWord,
    {
        self.try_update_live(pos, |word| Some(f(word)))?.ok()
    }

    /// Atomically apply `f` to the live word unless it declines.
    ///
    /// Returns `None` when out of bounds, `Some(Ok(previous))` when the word was
    /// replaced and `Some(Err(current))` when `f` returned `None`.
    pub fn try_update_live<F>(&self, pos: BlockPos, mut f: F) -> Option<Result<CellWord, CellWord>>
    where
        F: FnMut(CellWord) -> Option<CellWord>,
    {
        let index = self.cuboid.resolve(pos)?;
        let result = self.live[index.get()]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                f(CellWord::from_bits(bits)).map(CellWord::to_bits)
            })
            .map(CellWord::from_bits)
            .map_err(CellWord::from_bits);

        if result.is_ok() {
            self.touch(index);
        }
        Some(result)
    }

    /// Set the live data to `new` iff it currently equals `expected`.
    ///
    /// Concurrent changes to other fields of the same cell never make this
    /// fail; only a `data` mismatch does.
    pub fn compare_and_set_data(&self, pos: BlockPos, expected: u16, new: u16) -> bool {
        matches!(
            self.try_update_live(pos, |word| {
                (word.data() == expected).then(|| word.with_data(new))
            }),
            Some(Ok(_))
        )
    }

    /// Replace one field of the live data, returning the previous field value.
    pub fn set_bit_field(&self, pos: BlockPos, field: BitField, value: u16) -> Option<u16> {
        self.update_live(pos, |word| word.with_data(field.set(word.data(), value)))
            .map(|previous| field.get(previous.data()))
    }

    /// `data |= bits`, returning the previous data.
    pub fn set_data_bits(&self, pos: BlockPos, bits: u16) -> Option<u16> {
        let index = self.cuboid.resolve(pos)?;
        let previous = self.live[index.get()].fetch_or(u64::from(bits), Ordering::AcqRel);
        self.touch(index);
        Some(CellWord::from_bits(previous).data())
    }

    /// `data &= !bits`, returning the previous data.
    pub fn clear_data_bits(&self, pos: BlockPos, bits: u16) -> Option<u16> {
        let index = self.cuboid.resolve(pos)?;
        let previous = self.live[index.get()].fetch_and(!u64::from(bits), Ordering::AcqRel);
        self.touch(index);
        Some(CellWord::from_bits(previous).data())
    }

    // ==================== Tick Boundary ====================

    /// Publish every cell touched since the last finalize to the snapshot.
    ///
    /// Cost is proportional to the number of touched cells. Returns that
    /// number. Calling it again with no intervening writes changes nothing.
    pub fn finalize_tick(&mut self) -> usize {
        let touched = self.touched.collect_all();

        for &index in &touched {
            let i = index.get();
            self.snapshot[i] = CellWord::from_bits(*self.live[i].get_mut());
            *self.dirty[i / 64].get_mut() &= !(1 << (i % 64));
        }

        self.generation += 1;
        debug!(
            generation = self.generation,
            touched = touched.len(),
            "finalized tick"
        );

        touched.len()
    }

    /// Cells touched since the last finalize.
    pub fn pending_touched(&mut self) -> usize {
        self.touched.total_pending()
    }

    // ==================== Internals ====================

    #[inline]
    fn live_word(&self, index: CellIndex) -> CellWord {
        CellWord::from_bits(self.live[index.get()].load(Ordering::Acquire))
    }

    /// Record the first write to a cell this tick.
    #[inline]
    fn touch(&self, index: CellIndex) {
        let i = index.get();
        let bit = 1u64 << (i % 64);
        if self.dirty[i / 64].fetch_or(bit, Ordering::Relaxed) & bit == 0 {
            self.touched.push(index);
        }
    }
}

impl core::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("cuboid", &self.cuboid)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaterialId;

    const STONE: MaterialId = MaterialId(1);
    const DIRT: MaterialId = MaterialId(2);

    fn store() -> SnapshotStore {
        SnapshotStore::new(Cuboid::cube(BlockPos::ZERO, 16)).unwrap()
    }

    #[test]
    fn test_rejects_empty_cuboid() {
        let cuboid = Cuboid::new(BlockPos::ZERO, 16, 0, 16);
        assert_eq!(
            SnapshotStore::new(cuboid).unwrap_err(),
            StorageError::EmptyVolume(cuboid)
        );
    }

    #[test]
    fn test_rejects_oversized_cuboid() {
        let cuboid = Cuboid::new(BlockPos::ZERO, u32::MAX, 2, 1);
        assert!(matches!(
            SnapshotStore::new(cuboid),
            Err(StorageError::VolumeTooLarge { volume, .. }) if volume == 2 * u64::from(u32::MAX)
        ));
    }

    #[test]
    fn test_rejects_cuboid_past_coordinate_range() {
        let cuboid = Cuboid::new(BlockPos::new(i32::MAX, 0, 0), 2, 1, 1);
        assert_eq!(
            SnapshotStore::new(cuboid).unwrap_err(),
            StorageError::CoordinateOverflow(cuboid)
        );

        let edge = Cuboid::new(BlockPos::new(i32::MAX - 1, 0, 0), 2, 1, 1);
        assert!(SnapshotStore::new(edge).is_ok());
    }

    #[test]
    fn test_never_written_reads_empty() {
        let store = store();
        let pos = BlockPos::new(3, 4, 5);
        assert_eq!(store.read_snapshot(pos), CellWord::EMPTY);
        assert_eq!(store.read_live(pos), CellWord::EMPTY);
    }

    #[test]
    fn test_write_is_delayed_until_finalize() {
        let mut store = store();
        let pos = BlockPos::new(1, 2, 3);
        let word = CellWord::new(STONE, 7);

        assert!(store.write_live(pos, word));
        assert_eq!(store.read_live(pos), word);
        assert_eq!(store.read_snapshot(pos), CellWord::EMPTY);

        assert_eq!(store.finalize_tick(), 1);
        assert_eq!(store.read_snapshot(pos), word);
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_out_of_bounds_is_sentinel() {
        let store = store();
        let outside = BlockPos::new(16, 0, 0);

        assert!(!store.write_live(outside, CellWord::new(STONE, 0)));
        assert!(!store.compare_and_set_data(outside, 0, 1));
        assert_eq!(store.read_live(outside), CellWord::EMPTY);
        assert_eq!(store.read_snapshot(outside), CellWord::EMPTY);
        assert_eq!(store.get_bit_field(outside, BitField::ALL), None);
        assert_eq!(store.set_bit_field(outside, BitField::ALL, 1), None);
        assert_eq!(store.set_data_bits(outside, 1), None);
        assert_eq!(store.clear_data_bits(outside, 1), None);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut store = store();
        let pos = BlockPos::new(0, 0, 0);
        store.write_live(pos, CellWord::new(DIRT, 1));

        assert_eq!(store.finalize_tick(), 1);
        let first: Vec<_> = store.cuboid().iter().map(|p| store.read_snapshot(p)).collect();

        assert_eq!(store.finalize_tick(), 0);
        let second: Vec<_> = store.cuboid().iter().map(|p| store.read_snapshot(p)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_repeated_writes_touch_once() {
        let mut store = store();
        let pos = BlockPos::new(5, 5, 5);

        for data in 0..10 {
            store.write_live(pos, CellWord::new(STONE, data));
        }
        assert_eq!(store.pending_touched(), 1);
        assert_eq!(store.finalize_tick(), 1);
        assert_eq!(store.read_snapshot(pos).data(), 9);

        // dirty bit was cleared, so the next tick tracks the cell again
        store.write_live(pos, CellWord::new(STONE, 10));
        assert_eq!(store.finalize_tick(), 1);
        assert_eq!(store.read_snapshot(pos).data(), 10);
    }

    #[test]
    fn test_compare_and_set_data() {
        let store = store();
        let pos = BlockPos::new(2, 2, 2);
        store.write_live(pos, CellWord::new(STONE, 4));

        assert!(!store.compare_and_set_data(pos, 5, 6));
        assert_eq!(store.read_live(pos).data(), 4);

        assert!(store.compare_and_set_data(pos, 4, 6));
        assert_eq!(store.read_live(pos).data(), 6);
        assert_eq!(store.read_live(pos).material(), STONE);
    }

    #[test]
    fn test_failed_cas_does_not_touch() {
        let mut store = store();
        assert!(!store.compare_and_set_data(BlockPos::ZERO, 1, 2));
        assert_eq!(store.pending_touched(), 0);
    }

    #[test]
    fn test_bit_fields_and_data_bits() {
        let store = store();
        let pos = BlockPos::new(7, 0, 7);
        let facing = BitField::new(0x0003);
        let stage = BitField::new(0x00F0);

        assert_eq!(store.set_bit_field(pos, facing, 2), Some(0));
        assert_eq!(store.set_bit_field(pos, stage, 9), Some(0));
        assert_eq!(store.set_bit_field(pos, stage, 3), Some(9));
        assert_eq!(store.get_bit_field(pos, facing), Some(2));
        assert_eq!(store.get_bit_field(pos, stage), Some(3));
        assert_eq!(store.read_live(pos).data(), 0x0032);

        assert_eq!(store.set_data_bits(pos, 0x8000), Some(0x0032));
        assert_eq!(store.clear_data_bits(pos, 0x0002), Some(0x8032));
        assert_eq!(store.read_live(pos).data(), 0x8030);
    }

    #[test]
    fn test_data_bits_leave_other_fields_alone() {
        let store = store();
        let pos = BlockPos::new(1, 1, 1);
        let word = CellWord::new(STONE, 0).with_block_light(12).unwrap();
        store.write_live(pos, word);

        store.set_data_bits(pos, 0xFFFF);
        store.clear_data_bits(pos, 0xFFFF);
        assert_eq!(store.read_live(pos), word);
    }

    #[test]
    fn test_try_update_live_declined() {
        let store = store();
        let pos = BlockPos::new(0, 1, 0);
        store.write_live(pos, CellWord::new(STONE, 3));

        let result = store.try_update_live(pos, |_| None);
        assert_eq!(result, Some(Err(CellWord::new(STONE, 3))));
    }
}
