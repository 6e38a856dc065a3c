//! Opaque hints carried by dynamic updates.

use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

/// Non-persistent data attached to a dynamic update.
///
/// The queue never looks inside a hint; it is handed back to the update
/// callback as-is. Cloning is cheap (shared ownership).
#[derive(Clone)]
pub struct Hint {
    value: Arc<dyn Any + Send + Sync>,
}

impl Hint {
    /// Wrap any value as a hint.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    /// Borrow the hint as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Check if the hint holds a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Type of the wrapped value.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        (*self.value).type_id()
    }
}

impl fmt::Debug for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hint").finish_non_exhaustive()
    }
}
