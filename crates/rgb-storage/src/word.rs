//! Packed per-cell state.
//!
//! # Layout
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  CellWord (u64)                                                │
//! ├────────────────────────────────────────────────────────────────┤
//! │  bits  0..16  data        - material-specific sub-state        │
//! │  bits 16..32  material    - MaterialId, 0 = air                │
//! │  bits 32..36  block light - 0..=15                             │
//! │  bits 36..40  sky light   - 0..=15                             │
//! │  bits 40..64  controller  - ControllerId, 0 = none             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keeping `data` in the low bits lets the store apply `data |= bits` and
//! `data &= !bits` with a single atomic `fetch_or` / `fetch_and`.

use std::{fmt, num::NonZeroU32};

const DATA_SHIFT: u32 = 0;
const MATERIAL_SHIFT: u32 = 16;
const BLOCK_LIGHT_SHIFT: u32 = 32;
const SKY_LIGHT_SHIFT: u32 = 36;
const CONTROLLER_SHIFT: u32 = 40;

const DATA_MASK: u64 = 0xFFFF << DATA_SHIFT;
const MATERIAL_MASK: u64 = 0xFFFF << MATERIAL_SHIFT;
const BLOCK_LIGHT_MASK: u64 = 0xF << BLOCK_LIGHT_SHIFT;
const SKY_LIGHT_MASK: u64 = 0xF << SKY_LIGHT_SHIFT;
const CONTROLLER_MASK: u64 = 0xFF_FFFF << CONTROLLER_SHIFT;

/// Highest block or sky light level.
pub const MAX_LIGHT: u8 = 15;

/// Identifier of a block material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MaterialId(pub u16);

impl MaterialId {
    /// The empty material every cell starts with.
    pub const AIR: MaterialId = MaterialId(0);

    /// Check if this is air.
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Non-owning handle to a block controller held by an external registry.
///
/// Ids are 24 bits wide so they fit in a [`CellWord`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId(NonZeroU32);

impl ControllerId {
    /// Largest id that fits in a cell word.
    pub const MAX: u32 = 0xFF_FFFF;

    /// Create a controller id. Returns `None` for `0` or ids above [`ControllerId::MAX`].
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        if raw > Self::MAX {
            return None;
        }
        match NonZeroU32::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Get the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControllerId({})", self.0)
    }
}

/// The packed state of one cell.
///
/// `CellWord` is a plain value: the store hands out copies and mutates its
/// own atomic slots. Every constructor keeps each field within its bit width.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct CellWord(u64);

impl CellWord {
    /// Air, no data, no light, no controller. Also the out-of-bounds sentinel.
    pub const EMPTY: CellWord = CellWord(0);

    /// A cell of the given material and data, with no light or controller.
    #[must_use]
    pub const fn new(material: MaterialId, data: u16) -> Self {
        Self::EMPTY.with_material(material).with_data(data)
    }

    /// Reinterpret raw bits.
    ///
    /// Any `u64` is a valid cell word; the controller field decodes to `None`
    /// when zero.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits, as stored in the live generation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn data(self) -> u16 {
        ((self.0 & DATA_MASK) >> DATA_SHIFT) as u16
    }

    #[inline]
    #[must_use]
    pub const fn material(self) -> MaterialId {
        MaterialId(((self.0 & MATERIAL_MASK) >> MATERIAL_SHIFT) as u16)
    }

    #[inline]
    #[must_use]
    pub const fn block_light(self) -> u8 {
        ((self.0 & BLOCK_LIGHT_MASK) >> BLOCK_LIGHT_SHIFT) as u8
    }

    #[inline]
    #[must_use]
    pub const fn sky_light(self) -> u8 {
        ((self.0 & SKY_LIGHT_MASK) >> SKY_LIGHT_SHIFT) as u8
    }

    /// The attached controller, if the cell is active.
    #[inline]
    #[must_use]
    pub const fn controller(self) -> Option<ControllerId> {
        ControllerId::new(((self.0 & CONTROLLER_MASK) >> CONTROLLER_SHIFT) as u32)
    }

    /// A cell is active when it has a controller attached.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.0 & CONTROLLER_MASK != 0
    }

    #[must_use]
    pub const fn with_data(self, data: u16) -> Self {
        Self((self.0 & !DATA_MASK) | ((data as u64) << DATA_SHIFT))
    }

    #[must_use]
    pub const fn with_material(self, material: MaterialId) -> Self {
        Self((self.0 & !MATERIAL_MASK) | ((material.0 as u64) << MATERIAL_SHIFT))
    }

    /// Replace the block light level. Returns `None` if `light > MAX_LIGHT`.
    #[must_use]
    pub const fn with_block_light(self, light: u8) -> Option<Self> {
        if light > MAX_LIGHT {
            return None;
        }
        Some(Self(
            (self.0 & !BLOCK_LIGHT_MASK) | ((light as u64) << BLOCK_LIGHT_SHIFT),
        ))
    }

    /// Replace the sky light level. Returns `None` if `light > MAX_LIGHT`.
    #[must_use]
    pub const fn with_sky_light(self, light: u8) -> Option<Self> {
        if light > MAX_LIGHT {
            return None;
        }
        Some(Self(
            (self.0 & !SKY_LIGHT_MASK) | ((light as u64) << SKY_LIGHT_SHIFT),
        ))
    }

    #[must_use]
    pub const fn with_controller(self, controller: Option<ControllerId>) -> Self {
        let raw = match controller {
            Some(id) => id.get() as u64,
            None => 0,
        };
        Self((self.0 & !CONTROLLER_MASK) | (raw << CONTROLLER_SHIFT))
    }
}

impl fmt::Debug for CellWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellWord")
            .field("material", &self.material().0)
            .field("data", &format_args!("{:#06x}", self.data()))
            .field("block_light", &self.block_light())
            .field("sky_light", &self.sky_light())
            .field("controller", &self.controller())
            .finish()
    }
}
