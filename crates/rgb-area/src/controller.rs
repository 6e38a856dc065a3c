//! Block controllers and the registry that owns them.
//!
//! Cells only store a [`ControllerId`]. The controller object itself lives in
//! a [`ControllerRegistry`], which decides its lifetime; once unregistered, the
//! id resolves to nothing and updates for it are skipped.

use std::sync::Arc;

use parking_lot::RwLock;
use rgb_spatial::BlockPos;
use rgb_storage::ControllerId;
use rgb_tick::Hint;
use tracing::debug;

use crate::{AreaAccess, RegistryError};

/// Behavior attached to an active cell.
pub trait BlockController: Send + Sync + 'static {
    /// A dynamic update queued for `pos` became due.
    ///
    /// Runs after finalize with the area shared, so it may read snapshots and
    /// write the live generation like any worker.
    fn on_dynamic_update(&self, area: &AreaAccess, pos: BlockPos, hint: Option<&Hint>);
}

// Implement BlockController for closures
impl<F> BlockController for F
where
    F: Fn(&AreaAccess, BlockPos, Option<&Hint>) + Send + Sync + 'static,
{
    fn on_dynamic_update(&self, area: &AreaAccess, pos: BlockPos, hint: Option<&Hint>) {
        self(area, pos, hint);
    }
}

/// Owner of every controller an area can reference.
///
/// Ids are never reused, so a stale id in a cell can not resolve to a
/// different controller.
#[derive(Default)]
pub struct ControllerRegistry {
    /// Slot `i` holds the controller with id `i + 1`.
    slots: RwLock<Vec<Option<Arc<dyn BlockController>>>>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller and return its id.
    pub fn register(
        &self,
        controller: impl BlockController,
    ) -> Result<ControllerId, RegistryError> {
        let mut slots = self.slots.write();
        let raw = u32::try_from(slots.len() + 1).map_err(|_| RegistryError::Exhausted)?;
        let id = ControllerId::new(raw).ok_or(RegistryError::Exhausted)?;

        slots.push(Some(Arc::new(controller)));
        debug!(?id, "registered block controller");
        Ok(id)
    }

    /// Drop the registry's handle to a controller.
    pub fn unregister(&self, id: ControllerId) -> Option<Arc<dyn BlockController>> {
        let removed = self
            .slots
            .write()
            .get_mut(id.get() as usize - 1)
            .and_then(Option::take);
        if removed.is_some() {
            debug!(?id, "unregistered block controller");
        }
        removed
    }

    /// Look up a live controller.
    #[must_use]
    pub fn get(&self, id: ControllerId) -> Option<Arc<dyn BlockController>> {
        self.slots
            .read()
            .get(id.get() as usize - 1)
            .and_then(Clone::clone)
    }

    /// Number of registered controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("registered", &self.len())
            .finish()
    }
}
