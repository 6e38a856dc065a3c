//! Collision policies for dynamic updates.

use core::ops::Range;

/// What happens when a new update targets a cell that already has pending
/// updates.
///
/// Pending entries of a cell are ordered by due time (ties by insertion
/// order). "First" and "last" refer to that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum InsertionPolicy {
    /// Always add the new update alongside the existing ones.
    #[default]
    ReplaceNone,
    /// Replace the earliest-due pending update.
    First,
    /// Replace the latest-due pending update.
    Last,
    /// Replace every pending update.
    All,
}

/// Outcome of applying a policy to a cell's pending list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Victims {
    /// Insert without removing anything.
    Keep,
    /// Remove these entries (indices into the ordered pending list), then insert.
    Replace(Range<usize>),
    /// Nothing to replace; drop the new update.
    Discard,
}

impl InsertionPolicy {
    /// Select the entries a new update replaces, given how many are pending.
    #[must_use]
    pub const fn victims(self, pending: usize) -> Victims {
        match self {
            Self::ReplaceNone => Victims::Keep,
            _ if pending == 0 => Victims::Discard,
            Self::First => Victims::Replace(0..1),
            Self::Last => Victims::Replace(pending - 1..pending),
            Self::All => Victims::Replace(0..pending),
        }
    }
}
