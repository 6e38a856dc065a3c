//! Sharded, due-time ordered queue of dynamic block updates.

use std::{
    collections::BTreeSet,
    hash::BuildHasher,
    sync::atomic::{AtomicU64, Ordering},
};

use crossbeam::utils::CachePadded;
use hashbrown::HashMap;
use parking_lot::Mutex;
use rgb_spatial::BlockPos;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{Hint, InsertionPolicy, TickTime, Victims};

/// Default number of lock shards.
pub const DEFAULT_SHARDS: usize = 16;

/// A dynamic update drained from the queue.
#[derive(Clone, Debug)]
pub struct PendingUpdate {
    /// Cell to update.
    pub pos: BlockPos,
    /// Tick at which the update became due.
    pub due: TickTime,
    /// Opaque data for the callback.
    pub hint: Option<Hint>,
    /// Global insertion order, used to break due-time ties.
    seq: u64,
}

impl PendingUpdate {
    /// Insertion sequence number. Lower means queued earlier.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

/// One pending entry in a cell's list.
#[derive(Clone, Debug)]
struct Entry {
    due: TickTime,
    seq: u64,
    hint: Option<Hint>,
}

/// Global ordering key. `seq` is unique, so `pos` never decides order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct DueKey {
    due: TickTime,
    seq: u64,
    pos: BlockPos,
}

/// Entries of one cell, ordered by `(due, seq)`.
type CellList = SmallVec<[Entry; 2]>;

#[derive(Default)]
struct Shard {
    /// Pending entries per cell.
    by_pos: HashMap<BlockPos, CellList, FxBuildHasher>,
    /// Every entry of this shard ordered by due time.
    by_due: BTreeSet<DueKey>,
}

impl Shard {
    fn len(&self) -> usize {
        self.by_due.len()
    }

    fn remove_range(&mut self, pos: BlockPos, list: &mut CellList, range: core::ops::Range<usize>) {
        for entry in list.drain(range) {
            self.by_due.remove(&DueKey {
                due: entry.due,
                seq: entry.seq,
                pos,
            });
        }
    }
}

/// Per-cell, time-ordered collection of pending dynamic updates.
///
/// `queue_update` and `reset_updates` may be called from any thread; each
/// locks only the shard owning the cell. `drain_due` takes `&mut self`, so it
/// runs without locking once the simulate phase has ended.
pub struct DynamicUpdateQueue {
    shards: Box<[CachePadded<Mutex<Shard>>]>,
    /// `shards.len() - 1`; the shard count is a power of two.
    shard_mask: usize,
    next_seq: AtomicU64,
}

impl DynamicUpdateQueue {
    /// Create a queue with [`DEFAULT_SHARDS`] shards.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a queue with at least `shards` shards (rounded up to a power of two).
    #[must_use]
    pub fn with_shards(shards: usize) -> Self {
        let count = shards.max(1).next_power_of_two();
        Self {
            shards: (0..count)
                .map(|_| CachePadded::new(Mutex::new(Shard::default())))
                .collect(),
            shard_mask: count - 1,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of lock shards.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, pos: BlockPos) -> &Mutex<Shard> {
        let hash = FxBuildHasher.hash_one(pos) as usize;
        &self.shards[hash & self.shard_mask]
    }

    /// Schedule an update for `pos`, due at tick `due`.
    ///
    /// The policy decides which pending entries of the cell the new update
    /// replaces. Returns `false` when the policy found nothing to replace and
    /// the update was dropped.
    ///
    /// Updates with equal due times drain in the order their `queue_update`
    /// calls began. The sequence number is taken before the shard lock, so two
    /// racing calls on one shard may acquire the lock in the opposite order.
    pub fn queue_update(
        &self,
        pos: BlockPos,
        due: TickTime,
        policy: InsertionPolicy,
        hint: Option<Hint>,
    ) -> bool {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.shard(pos).lock();
        let shard = &mut *guard;

        let pending = shard.by_pos.get(&pos).map_or(0, SmallVec::len);
        let victims = policy.victims(pending);
        if victims == Victims::Discard {
            trace!(?pos, due, ?policy, "dynamic update discarded");
            return false;
        }

        let mut list = shard.by_pos.remove(&pos).unwrap_or_default();
        if let Victims::Replace(range) = victims {
            shard.remove_range(pos, &mut list, range);
        }

        let at = list.partition_point(|e| (e.due, e.seq) <= (due, seq));
        list.insert(at, Entry { due, seq, hint });
        shard.by_due.insert(DueKey { due, seq, pos });
        shard.by_pos.insert(pos, list);

        true
    }

    /// Remove every pending update for `pos`. Returns how many were removed.
    pub fn reset_updates(&self, pos: BlockPos) -> usize {
        let mut guard = self.shard(pos).lock();
        let shard = &mut *guard;

        let Some(mut list) = shard.by_pos.remove(&pos) else {
            return 0;
        };
        let removed = list.len();
        shard.remove_range(pos, &mut list, 0..removed);

        trace!(?pos, removed, "dynamic updates reset");
        removed
    }

    /// Due times of the updates pending for `pos`, in firing order.
    #[must_use]
    pub fn pending(&self, pos: BlockPos) -> Vec<TickTime> {
        self.shard(pos)
            .lock()
            .by_pos
            .get(&pos)
            .map(|list| list.iter().map(|e| e.due).collect())
            .unwrap_or_default()
    }

    /// Check if `pos` has any pending update.
    #[must_use]
    pub fn has_pending(&self, pos: BlockPos) -> bool {
        self.shard(pos).lock().by_pos.contains_key(&pos)
    }

    /// Earliest due time across all cells.
    #[must_use]
    pub fn next_due(&self) -> Option<TickTime> {
        self.shards
            .iter()
            .filter_map(|shard| shard.lock().by_due.first().map(|key| key.due))
            .min()
    }

    /// Total pending updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Check if no update is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.lock().by_due.is_empty())
    }

    /// Remove and return every update with `due <= now`.
    ///
    /// The result is ordered by due time; updates with the same due time come
    /// out in the order they were queued.
    pub fn drain_due(&mut self, now: TickTime) -> Vec<PendingUpdate> {
        let mut drained = Vec::new();

        for shard in self.shards.iter_mut() {
            let shard = shard.get_mut();

            let due = match now.checked_add(1) {
                Some(after) => {
                    let later = shard.by_due.split_off(&DueKey {
                        due: after,
                        seq: 0,
                        pos: BlockPos::MIN,
                    });
                    core::mem::replace(&mut shard.by_due, later)
                }
                None => core::mem::take(&mut shard.by_due),
            };

            for key in due {
                let Some(list) = shard.by_pos.get_mut(&key.pos) else {
                    continue;
                };

                // Due keys come out in (due, seq) order, which is also the
                // order of each cell's list, so the entry is always first.
                let entry = list.remove(0);
                debug_assert_eq!(entry.seq, key.seq);
                if list.is_empty() {
                    shard.by_pos.remove(&key.pos);
                }

                drained.push(PendingUpdate {
                    pos: key.pos,
                    due: entry.due,
                    hint: entry.hint,
                    seq: entry.seq,
                });
            }
        }

        drained.sort_unstable_by_key(|update| (update.due, update.seq));
        debug!(now, drained = drained.len(), "drained dynamic updates");
        drained
    }

    /// Drop every pending update.
    pub fn clear(&mut self) {
        for shard in self.shards.iter_mut() {
            let shard = shard.get_mut();
            shard.by_pos.clear();
            shard.by_due.clear();
        }
    }
}

impl Default for DynamicUpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for DynamicUpdateQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicUpdateQueue")
            .field("shards", &self.shards.len())
            .field("pending", &self.len())
            .finish()
    }
}
