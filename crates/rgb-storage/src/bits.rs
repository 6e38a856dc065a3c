//! Bit fields inside the 16-bit data word.
//!
//! A field is described by a mask. Its value is right-aligned by shifting out
//! the mask's trailing zero bits:
//!
//! ```text
//! get: field = (data & mask) >> shift
//! set: data  = ((value << shift) & mask) | (data & !mask)
//! ```
//!
//! Masks may be sparse; value bits that do not land on a mask bit are dropped.

/// Shift that moves the lowest set bit of `mask` to bit 0.
///
/// An empty mask has shift `0`.
#[inline]
#[must_use]
pub const fn shift_for(mask: u16) -> u32 {
    if mask == 0 { 0 } else { mask.trailing_zeros() }
}

/// A field of the data word, with its shift computed once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitField {
    mask: u16,
    shift: u32,
}

impl BitField {
    /// The whole data word.
    pub const ALL: BitField = BitField::new(0xFFFF);

    #[must_use]
    pub const fn new(mask: u16) -> Self {
        Self {
            mask,
            shift: shift_for(mask),
        }
    }

    #[must_use]
    pub const fn mask(self) -> u16 {
        self.mask
    }

    #[must_use]
    pub const fn shift(self) -> u32 {
        self.shift
    }

    /// Largest right-aligned value the field can hold.
    #[must_use]
    pub const fn max_value(self) -> u16 {
        self.mask >> self.shift
    }

    /// Extract the field from a data word.
    #[inline]
    #[must_use]
    pub const fn get(self, data: u16) -> u16 {
        (data & self.mask) >> self.shift
    }

    /// Replace the field in a data word, truncating `value` to the mask.
    #[inline]
    #[must_use]
    pub const fn set(self, data: u16, value: u16) -> u16 {
        ((value << self.shift) & self.mask) | (data & !self.mask)
    }
}
