//! Dynamic block updates scheduled against the tick clock.
//!
//! # Tick Execution Model
//!
//! ```text
//! Tick N:
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Phase 1: Simulate (parallel)                               │
//! │           workers read the snapshot, write live cells,      │
//! │           queue_update / reset_updates from any thread      │
//! │  Phase 2: Barrier                                           │
//! │  Phase 3: Finalize (single thread)                          │
//! │           publish live → snapshot, then drain_due(now)      │
//! │  Phase 4: Dispatch drained updates in (due, insertion) order│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Updates are kept per cell in due-time order and indexed globally by due
//! time. When a new update targets a cell that already has pending entries,
//! its [`InsertionPolicy`] decides which entries it replaces.

mod hint;
mod policy;
mod queue;

pub use hint::Hint;
pub use policy::{InsertionPolicy, Victims};
pub use queue::{DEFAULT_SHARDS, DynamicUpdateQueue, PendingUpdate};

/// A point on the simulation clock, in ticks.
pub type TickTime = u64;
