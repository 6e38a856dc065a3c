//! AreaAccess - the block-level API over one cuboid of the world.

use std::sync::Arc;

use rgb_spatial::{BlockPos, Cuboid};
use rgb_storage::{BitField, CellWord, ControllerId, MAX_LIGHT, MaterialId, SnapshotStore};
use rgb_tick::{DynamicUpdateQueue, Hint, InsertionPolicy, PendingUpdate, TickTime};
use tracing::{debug, trace};

use crate::{
    AreaConfig, AreaResult, Block, BlockChange, BlockChangeListener, ChangeKind,
    ControllerRegistry, Source,
};

/// Hint attached to updates queued by [`AreaAccess::update_block_physics`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicsUpdate {
    pub source: Source,
}

/// Tick-synchronized access to every block of a cuboid.
///
/// During the simulate phase, share it by reference across workers: reads,
/// writes and update scheduling all take `&self`. Between ticks, the
/// coordinator calls [`finalize_tick`](Self::finalize_tick), which needs
/// `&mut self` and so can not overlap with any worker.
pub struct AreaAccess {
    store: SnapshotStore,
    updates: DynamicUpdateQueue,
    controllers: Arc<ControllerRegistry>,
    listener: Option<Arc<dyn BlockChangeListener>>,
    now: TickTime,
}

impl AreaAccess {
    /// Build an area from configuration.
    pub fn new(config: &AreaConfig) -> AreaResult<Self> {
        config.validate()?;
        let store = SnapshotStore::new(config.cuboid())?;

        debug!(
            cuboid = %config.cuboid(),
            shards = config.queue_shards,
            start_time = config.start_time,
            "created area"
        );

        Ok(Self {
            store,
            updates: DynamicUpdateQueue::with_shards(config.queue_shards),
            controllers: Arc::new(ControllerRegistry::new()),
            listener: None,
            now: config.start_time,
        })
    }

    /// Build an area over `cuboid` with default settings.
    pub fn with_cuboid(cuboid: Cuboid) -> AreaResult<Self> {
        Self::new(&AreaConfig::for_cuboid(cuboid))
    }

    /// Notify `listener` of every successful mutation.
    #[must_use]
    pub fn with_listener(mut self, listener: impl BlockChangeListener) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Share a controller registry with other areas.
    #[must_use]
    pub fn with_controllers(mut self, controllers: Arc<ControllerRegistry>) -> Self {
        self.controllers = controllers;
        self
    }

    // ==================== Accessors ====================

    #[must_use]
    pub fn controllers(&self) -> &Arc<ControllerRegistry> {
        &self.controllers
    }

    #[must_use]
    pub const fn cuboid(&self) -> &Cuboid {
        self.store.cuboid()
    }

    /// Current tick time. Updates queued without a due time are due now.
    #[must_use]
    pub const fn now(&self) -> TickTime {
        self.now
    }

    #[must_use]
    pub const fn store(&self) -> &SnapshotStore {
        &self.store
    }

    #[must_use]
    pub const fn updates(&self) -> &DynamicUpdateQueue {
        &self.updates
    }

    #[must_use]
    pub fn contains_block(&self, pos: BlockPos) -> bool {
        self.store.contains(pos)
    }

    // ==================== Reads ====================

    /// State as of the last finalize. [`CellWord::EMPTY`] outside the area.
    #[must_use]
    pub fn read_snapshot(&self, pos: BlockPos) -> CellWord {
        self.store.read_snapshot(pos)
    }

    /// Best-effort in-progress state. [`CellWord::EMPTY`] outside the area.
    #[must_use]
    pub fn read_live(&self, pos: BlockPos) -> CellWord {
        self.store.read_live(pos)
    }

    /// One field of the live data word.
    #[must_use]
    pub fn data_field(&self, pos: BlockPos, field: BitField) -> Option<u16> {
        self.store.get_bit_field(pos, field)
    }

    // ==================== Block Handles ====================

    #[must_use]
    pub fn block(&self, pos: BlockPos) -> Block<'_> {
        Block::new(self, pos, Source::UNKNOWN)
    }

    #[must_use]
    pub fn block_with_source(&self, pos: BlockPos, source: Source) -> Block<'_> {
        Block::new(self, pos, source)
    }

    /// Handle for the block containing a world-space point.
    #[must_use]
    pub fn block_at(&self, x: f64, y: f64, z: f64) -> Block<'_> {
        self.block(BlockPos::from_f64(x, y, z))
    }

    #[must_use]
    pub fn block_at_with_source(&self, x: f64, y: f64, z: f64, source: Source) -> Block<'_> {
        self.block_with_source(BlockPos::from_f64(x, y, z), source)
    }

    // ==================== Mutators ====================

    /// Set material and data. Clears the cell's pending updates when the
    /// material actually changes.
    pub fn set_block_material(
        &self,
        pos: BlockPos,
        material: MaterialId,
        data: u16,
        source: Source,
    ) -> bool {
        let Some(previous) = self.swap(pos, |word| {
            Some(word.with_material(material).with_data(data))
        }) else {
            return false;
        };

        // The listener may queue updates for the new material
        if previous.material() != material {
            self.updates.reset_updates(pos);
        }
        self.notify(pos, ChangeKind::MATERIAL | ChangeKind::DATA, source);
        true
    }

    pub fn set_block_data(&self, pos: BlockPos, data: u16, source: Source) -> bool {
        self.mutate(pos, ChangeKind::DATA, source, |word| Some(word.with_data(data)))
            .is_some()
    }

    /// Set block light. Levels above 15 are rejected.
    pub fn set_block_light(&self, pos: BlockPos, light: u8, source: Source) -> bool {
        if light > MAX_LIGHT {
            trace!(?pos, light, "block light out of range");
            return false;
        }
        self.mutate(pos, ChangeKind::BLOCK_LIGHT, source, |word| {
            word.with_block_light(light)
        })
        .is_some()
    }

    /// Set sky light. Levels above 15 are rejected.
    pub fn set_block_sky_light(&self, pos: BlockPos, light: u8, source: Source) -> bool {
        if light > MAX_LIGHT {
            trace!(?pos, light, "sky light out of range");
            return false;
        }
        self.mutate(pos, ChangeKind::SKY_LIGHT, source, |word| {
            word.with_sky_light(light)
        })
        .is_some()
    }

    /// Attach or detach the cell's controller.
    pub fn set_block_controller(
        &self,
        pos: BlockPos,
        controller: Option<ControllerId>,
        source: Source,
    ) -> bool {
        self.mutate(pos, ChangeKind::CONTROLLER, source, |word| {
            Some(word.with_controller(controller))
        })
        .is_some()
    }

    /// Set the live data to `data` iff it currently equals `expected`.
    ///
    /// Light or controller changes racing on the same cell do not cause a
    /// spurious failure.
    pub fn compare_and_set_data(
        &self,
        pos: BlockPos,
        expected: u16,
        data: u16,
        source: Source,
    ) -> bool {
        self.mutate(pos, ChangeKind::DATA, source, |word| {
            (word.data() == expected).then(|| word.with_data(data))
        })
        .is_some()
    }

    /// `data |= bits`, returning the previous data.
    pub fn set_data_bits(&self, pos: BlockPos, bits: u16, source: Source) -> Option<u16> {
        let previous = self.store.set_data_bits(pos, bits)?;
        self.notify(pos, ChangeKind::DATA, source);
        Some(previous)
    }

    /// `data &= !bits`, returning the previous data.
    pub fn clear_data_bits(&self, pos: BlockPos, bits: u16, source: Source) -> Option<u16> {
        let previous = self.store.clear_data_bits(pos, bits)?;
        self.notify(pos, ChangeKind::DATA, source);
        Some(previous)
    }

    /// Replace one field of the data word, returning the previous field value.
    pub fn set_data_field(
        &self,
        pos: BlockPos,
        field: BitField,
        value: u16,
        source: Source,
    ) -> Option<u16> {
        let previous = self.store.set_bit_field(pos, field, value)?;
        self.notify(pos, ChangeKind::DATA, source);
        Some(previous)
    }

    // ==================== Dynamic Updates ====================

    /// Queue an update due now, hinting that a neighbor changed.
    pub fn update_block_physics(&self, pos: BlockPos, source: Source) -> bool {
        self.queue_dynamic_update_with(
            pos,
            self.now,
            InsertionPolicy::ReplaceNone,
            Some(Hint::new(PhysicsUpdate { source })),
        )
    }

    /// Queue an update due now.
    pub fn queue_dynamic_update(&self, pos: BlockPos) -> bool {
        self.queue_dynamic_update_at(pos, self.now)
    }

    /// Queue an update due at `due`.
    pub fn queue_dynamic_update_at(&self, pos: BlockPos, due: TickTime) -> bool {
        self.queue_dynamic_update_with(pos, due, InsertionPolicy::ReplaceNone, None)
    }

    /// Queue an update with an explicit policy and hint.
    ///
    /// Returns `false` outside the area or when the policy found nothing to
    /// replace.
    pub fn queue_dynamic_update_with(
        &self,
        pos: BlockPos,
        due: TickTime,
        policy: InsertionPolicy,
        hint: Option<Hint>,
    ) -> bool {
        if !self.contains_block(pos) {
            trace!(?pos, "dynamic update outside area");
            return false;
        }
        self.updates.queue_update(pos, due, policy, hint)
    }

    /// Drop every pending update for `pos`. Returns how many were dropped.
    pub fn reset_dynamic_block(&self, pos: BlockPos) -> usize {
        self.updates.reset_updates(pos)
    }

    // ==================== Tick Boundary ====================

    /// Publish this tick's writes, advance the clock to `now` and return the
    /// updates that are due, in `(due, insertion)` order.
    ///
    /// # Panics
    ///
    /// If `now` is earlier than the current tick time.
    pub fn finalize_tick(&mut self, now: TickTime) -> Vec<PendingUpdate> {
        assert!(
            now >= self.now,
            "tick time went backwards: {} -> {now}",
            self.now
        );

        let touched = self.store.finalize_tick();
        let due = self.updates.drain_due(now);
        self.now = now;

        debug!(now, touched, drained = due.len(), "finalized area tick");
        due
    }

    /// Deliver each update of `batch` to `callback`, in batch order.
    pub fn dispatch<F>(&self, batch: &[PendingUpdate], mut callback: F)
    where
        F: FnMut(BlockPos, Option<&Hint>),
    {
        for update in batch {
            callback(update.pos, update.hint.as_ref());
        }
    }

    /// Deliver each update of `batch` to the controller of its cell.
    ///
    /// The controller is taken from the snapshot word. Cells without a
    /// controller, or whose controller has been unregistered, are skipped.
    /// Returns the number of updates delivered.
    pub fn dispatch_to_controllers(&self, batch: &[PendingUpdate]) -> usize {
        let mut delivered = 0;
        for update in batch {
            let Some(id) = self.read_snapshot(update.pos).controller() else {
                trace!(pos = ?update.pos, "update for passive cell");
                continue;
            };
            let Some(controller) = self.controllers.get(id) else {
                trace!(pos = ?update.pos, ?id, "update for unregistered controller");
                continue;
            };

            controller.on_dynamic_update(self, update.pos, update.hint.as_ref());
            delivered += 1;
        }
        delivered
    }

    // ==================== Internals ====================

    /// Apply `f` atomically and notify on success. Returns the previous word.
    fn mutate<F>(
        &self,
        pos: BlockPos,
        changed: ChangeKind,
        source: Source,
        f: F,
    ) -> Option<CellWord>
    where
        F: FnMut(CellWord) -> Option<CellWord>,
    {
        let previous = self.swap(pos, f)?;
        self.notify(pos, changed, source);
        Some(previous)
    }

    /// Apply `f` atomically without notifying. Returns the previous word.
    fn swap<F>(&self, pos: BlockPos, f: F) -> Option<CellWord>
    where
        F: FnMut(CellWord) -> Option<CellWord>,
    {
        match self.store.try_update_live(pos, f) {
            Some(Ok(previous)) => Some(previous),
            Some(Err(current)) => {
                trace!(?pos, ?current, "mutation declined");
                None
            }
            None => {
                trace!(?pos, "mutation outside area");
                None
            }
        }
    }

    fn notify(&self, pos: BlockPos, changed: ChangeKind, source: Source) {
        if let Some(listener) = &self.listener {
            listener.on_block_change(&BlockChange {
                pos,
                changed,
                source,
            });
        }
    }
}

impl core::fmt::Debug for AreaAccess {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AreaAccess")
            .field("cuboid", self.cuboid())
            .field("now", &self.now)
            .field("pending_updates", &self.updates.len())
            .field("controllers", &self.controllers)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
