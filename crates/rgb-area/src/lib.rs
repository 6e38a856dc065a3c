//! Block-level access to a tick-synchronized area.
//!
//! [`AreaAccess`] ties a [`SnapshotStore`](rgb_storage::SnapshotStore) and a
//! [`DynamicUpdateQueue`](rgb_tick::DynamicUpdateQueue) to one cuboid of the
//! world and exposes them as a block API with change attribution.
//!
//! # Tick Loop
//!
//! ```text
//! ┌──────────────┐   &AreaAccess    ┌──────────────┐  &mut AreaAccess  ┌──────────────┐
//! │   Simulate   │ ───────────────► │   Barrier    │ ────────────────► │   Finalize   │
//! │ (rayon/any)  │  read_snapshot   │ (join/scope) │   finalize_tick   │  + dispatch  │
//! └──────────────┘  set_block_*     └──────────────┘                   └──────────────┘
//!        ▲          queue_dynamic_update                                      │
//!        └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut area = AreaAccess::new(&AreaConfig::load("area.toml")?)?;
//! let lamp = area.controllers().register(|area: &AreaAccess, pos, _hint: Option<&Hint>| {
//!     area.set_block_light(pos, 15, Source::UNKNOWN);
//! })?;
//!
//! area.set_block_controller(pos, Some(lamp), Source::UNKNOWN);
//! area.queue_dynamic_update_at(pos, 20);
//!
//! for tick in 1.. {
//!     // simulate...
//!     let due = area.finalize_tick(tick);
//!     area.dispatch_to_controllers(&due);
//! }
//! ```

mod access;
mod block;
mod config;
mod controller;
mod error;
mod listener;
mod source;

pub use access::{AreaAccess, PhysicsUpdate};
pub use block::Block;
pub use config::{AreaConfig, MAX_QUEUE_SHARDS};
pub use controller::{BlockController, ControllerRegistry};
pub use error::{AreaError, AreaResult, RegistryError};
pub use listener::{BlockChange, BlockChangeListener, ChangeKind};
pub use source::Source;
