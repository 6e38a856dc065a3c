//! Change attribution.

/// Who or what caused a change.
///
/// The store never interprets a source; it is passed through to change
/// listeners and diagnostics only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Source(u64);

impl Source {
    /// No known cause.
    pub const UNKNOWN: Source = Source(0);

    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}
