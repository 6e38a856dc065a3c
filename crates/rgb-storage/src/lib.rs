//! Tick-synchronized block storage for RGB worlds.
//!
//! Every cell of a [`Cuboid`](rgb_spatial::Cuboid) is stored twice:
//!
//! - **Snapshot generation**: frozen for the whole tick, readable from any
//!   thread without synchronization. Every reader in a tick sees the same world.
//! - **Live generation**: one atomic word per cell, mutated in place by worker
//!   threads. Visible to live reads immediately, to snapshot reads only after
//!   the next finalize.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  SnapshotStore                                                      │
//! │    - live: [AtomicU64]   (CAS, bit fields, whole-word writes)       │
//! │    - snapshot: [CellWord] (plain reads)                             │
//! │    - dirty bitmap + thread-local touched lists                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                              │ finalize_tick (&mut self)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  snapshot[i] = live[i] for touched i   → O(touched), not O(volume)  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use rgb_storage::{CellWord, MaterialId, SnapshotStore};
//!
//! let mut store = SnapshotStore::new(Cuboid::cube(BlockPos::ZERO, 16))?;
//!
//! std::thread::scope(|s| {
//!     s.spawn(|| store.write_live(pos, CellWord::new(MaterialId(1), 0)));
//! });
//!
//! // Publish the tick
//! store.finalize_tick();
//! assert_eq!(store.read_snapshot(pos).material(), MaterialId(1));
//! ```

mod bits;
mod buffer;
mod error;
mod snapshot;
mod word;

pub use bits::{BitField, shift_for};
pub use buffer::TouchedBuffers;
pub use error::{StorageError, StorageResult};
pub use snapshot::SnapshotStore;
pub use word::{CellWord, ControllerId, MAX_LIGHT, MaterialId};
