//! Falling sand and growing crops.
//!
//! Sand moves one block down per tick while the snapshot below it is air.
//! Crops are active blocks: their controller ages them on a fixed delay and
//! crushes them when sand lands on top.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use rgb_area::{AreaAccess, PhysicsUpdate, RegistryError, Source};
use rgb_spatial::BlockPos;
use rgb_storage::{BitField, ControllerId, MaterialId};
use rgb_tick::{Hint, InsertionPolicy, TickTime};

pub const STONE: MaterialId = MaterialId(1);
pub const SAND: MaterialId = MaterialId(12);
pub const CROP: MaterialId = MaterialId(59);

/// Crop age, stored in the low bits of the data word.
pub const CROP_AGE: BitField = BitField::new(0b0111);

/// Ticks between two growth stages.
pub const GROW_DELAY: TickTime = 5;

const GRAVITY: Source = Source::new(1);
const GROWTH: Source = Source::new(2);

/// Counters for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickStats {
    pub tick: TickTime,
    pub moved: usize,
    pub drained: usize,
    pub delivered: usize,
    pub pending: usize,
    pub elapsed: Duration,
}

/// Register the crop controller with the area's registry.
pub fn register_crop(area: &AreaAccess) -> Result<ControllerId, RegistryError> {
    area.controllers().register(grow_crop)
}

/// Stone floor, scattered crops on it, scattered sand at the top.
///
/// Writes go to the live generation; the caller finalizes. Returns the number
/// of crops planted.
pub fn seed(area: &AreaAccess, crop: ControllerId) -> usize {
    let cuboid = *area.cuboid();
    let base = cuboid.base();
    let Some(max) = cuboid.max_corner() else {
        return 0;
    };
    let height = cuboid.size()[1];

    let mut crops = 0;
    for x in base.x..=max.x {
        for z in base.z..=max.z {
            area.set_block_material(BlockPos::new(x, base.y, z), STONE, 0, Source::UNKNOWN);

            let roll = scatter(x, z);
            if height > 2 && roll % 5 == 0 {
                area.set_block_material(BlockPos::new(x, max.y, z), SAND, 0, Source::UNKNOWN);
            }
            if height > 1 && roll % 7 == 3 {
                plant(area, BlockPos::new(x, base.y + 1, z), crop);
                crops += 1;
            }
        }
    }
    crops
}

/// Place a crop and schedule its first growth stage.
pub fn plant(area: &AreaAccess, pos: BlockPos, crop: ControllerId) -> bool {
    area.set_block_material(pos, CROP, 0, GROWTH)
        && area.set_block_controller(pos, Some(crop), GROWTH)
        && area.queue_dynamic_update_at(pos, area.now() + GROW_DELAY)
}

/// Parallel phase: every column falls independently.
pub fn simulate(area: &AreaAccess) -> usize {
    let base = area.cuboid().base();
    let Some(max) = area.cuboid().max_corner() else {
        return 0;
    };

    (base.x..=max.x)
        .into_par_iter()
        .flat_map_iter(|x| (base.z..=max.z).map(move |z| (x, z)))
        .map(|(x, z)| fall_column(area, x, z, base.y, max.y))
        .sum()
}

/// Run one full tick: simulate, finalize, dispatch.
pub fn run_tick(area: &mut AreaAccess, pool: &rayon::ThreadPool) -> TickStats {
    let start = Instant::now();

    let moved = pool.install(|| simulate(area));

    let tick = area.now() + 1;
    let due = area.finalize_tick(tick);
    let delivered = area.dispatch_to_controllers(&due);

    TickStats {
        tick,
        moved,
        drained: due.len(),
        delivered,
        pending: area.updates().len(),
        elapsed: start.elapsed(),
    }
}

fn fall_column(area: &AreaAccess, x: i32, z: i32, bottom: i32, top: i32) -> usize {
    let mut moved = 0;
    for y in (bottom..=top).skip(1) {
        let pos = BlockPos::new(x, y, z);
        if area.read_snapshot(pos).material() != SAND {
            continue;
        }

        let below = pos.down();
        if !area.read_snapshot(below).material().is_air() {
            continue;
        }

        area.set_block_material(pos, MaterialId::AIR, 0, GRAVITY);
        area.set_block_material(below, SAND, 0, GRAVITY);
        moved += 1;

        // Landed: whatever is underneath feels the impact
        let under = below.down();
        if area.contains_block(under) && !area.read_snapshot(under).material().is_air() {
            area.update_block_physics(under, GRAVITY);
        }
    }
    moved
}

fn grow_crop(area: &AreaAccess, pos: BlockPos, hint: Option<&Hint>) {
    let block = area.block_with_source(pos, GROWTH);
    let word = block.live();
    if word.material() != CROP {
        return;
    }

    if hint.is_some_and(Hint::is::<PhysicsUpdate>) {
        if area.read_live(pos.up()).material() == SAND {
            block.set_material(MaterialId::AIR, 0);
            block.set_controller(None);
        }
        return;
    }

    let age = CROP_AGE.get(word.data());
    if age >= CROP_AGE.max_value() {
        return;
    }

    let grown = CROP_AGE.set(word.data(), age + 1);
    if block.compare_and_set_data(word.data(), grown) && age + 1 < CROP_AGE.max_value() {
        block.queue_update(
            Some(area.now() + GROW_DELAY),
            InsertionPolicy::ReplaceNone,
            None,
        );
    }
}

/// Cheap deterministic scatter for seeding.
fn scatter(x: i32, z: i32) -> u32 {
    let h = (x as u32).wrapping_mul(0x9E37_79B9) ^ (z as u32).wrapping_mul(0x85EB_CA6B);
    h ^ (h >> 16)
}
