//! Block handles.

use rgb_spatial::BlockPos;
use rgb_storage::{BitField, CellWord, ControllerId, MaterialId};
use rgb_tick::{Hint, InsertionPolicy, TickTime};

use crate::{AreaAccess, Source};

/// A position in an area, bound to the source its mutations are attributed to.
///
/// Handles are cheap to copy and hold no state of their own; every call
/// forwards to the [`AreaAccess`].
#[derive(Clone, Copy)]
pub struct Block<'a> {
    area: &'a AreaAccess,
    pos: BlockPos,
    source: Source,
}

impl<'a> Block<'a> {
    pub(crate) const fn new(area: &'a AreaAccess, pos: BlockPos, source: Source) -> Self {
        Self { area, pos, source }
    }

    #[must_use]
    pub const fn pos(&self) -> BlockPos {
        self.pos
    }

    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    #[must_use]
    pub const fn area(&self) -> &'a AreaAccess {
        self.area
    }

    /// Same block, attributing mutations to `source`.
    #[must_use]
    pub const fn with_source(self, source: Source) -> Self {
        Self { source, ..self }
    }

    /// Whether the block lies inside the area.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.area.contains_block(self.pos)
    }

    /// The block at an offset from this one, same source.
    #[must_use]
    pub const fn relative(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            pos: self.pos.offset(dx, dy, dz),
            ..*self
        }
    }

    // ==================== Reads ====================

    #[must_use]
    pub fn snapshot(&self) -> CellWord {
        self.area.read_snapshot(self.pos)
    }

    #[must_use]
    pub fn live(&self) -> CellWord {
        self.area.read_live(self.pos)
    }

    /// Material as of the last finalize.
    #[must_use]
    pub fn material(&self) -> MaterialId {
        self.snapshot().material()
    }

    /// Data as of the last finalize.
    #[must_use]
    pub fn data(&self) -> u16 {
        self.snapshot().data()
    }

    /// One field of the data as of the last finalize.
    #[must_use]
    pub fn data_field(&self, field: BitField) -> u16 {
        field.get(self.data())
    }

    /// One field of the live data word, including this tick's writes.
    /// `None` outside the area.
    #[must_use]
    pub fn live_data_field(&self, field: BitField) -> Option<u16> {
        self.area.data_field(self.pos, field)
    }

    // ==================== Mutators ====================

    pub fn set_material(&self, material: MaterialId, data: u16) -> bool {
        self.area
            .set_block_material(self.pos, material, data, self.source)
    }

    pub fn set_data(&self, data: u16) -> bool {
        self.area.set_block_data(self.pos, data, self.source)
    }

    pub fn set_block_light(&self, light: u8) -> bool {
        self.area.set_block_light(self.pos, light, self.source)
    }

    pub fn set_sky_light(&self, light: u8) -> bool {
        self.area.set_block_sky_light(self.pos, light, self.source)
    }

    pub fn set_controller(&self, controller: Option<ControllerId>) -> bool {
        self.area
            .set_block_controller(self.pos, controller, self.source)
    }

    pub fn compare_and_set_data(&self, expected: u16, data: u16) -> bool {
        self.area
            .compare_and_set_data(self.pos, expected, data, self.source)
    }

    pub fn set_data_field(&self, field: BitField, value: u16) -> Option<u16> {
        self.area
            .set_data_field(self.pos, field, value, self.source)
    }

    // ==================== Dynamic Updates ====================

    /// Queue an update; `due` defaults to now.
    pub fn queue_update(
        &self,
        due: Option<TickTime>,
        policy: InsertionPolicy,
        hint: Option<Hint>,
    ) -> bool {
        let due = due.unwrap_or_else(|| self.area.now());
        self.area
            .queue_dynamic_update_with(self.pos, due, policy, hint)
    }

    pub fn reset_updates(&self) -> usize {
        self.area.reset_dynamic_block(self.pos)
    }

    /// Queue an immediate physics update attributed to this handle's source.
    pub fn update_physics(&self) -> bool {
        self.area.update_block_physics(self.pos, self.source)
    }
}

impl core::fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Block")
            .field("pos", &self.pos)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
