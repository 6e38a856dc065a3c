//! Integration tests for rgb-area

use std::io::Write;
use std::sync::{Arc, OnceLock, Weak};
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use rgb_area::{
    AreaAccess, AreaConfig, BlockChange, ChangeKind, ControllerRegistry, PhysicsUpdate, Source,
};
use rgb_spatial::{BlockPos, Cuboid};
use rgb_storage::{CellWord, MaterialId};
use rgb_tick::{Hint, InsertionPolicy};

const STONE: MaterialId = MaterialId(1);
const SAND: MaterialId = MaterialId(12);

fn area(size: u32) -> AreaAccess {
    AreaAccess::with_cuboid(Cuboid::cube(BlockPos::ZERO, size)).unwrap()
}

// ============================================================================
// Tick Semantics
// ============================================================================

#[test]
fn test_snapshot_stable_during_parallel_writes() {
    let mut area = area(16);
    let cuboid = *area.cuboid();

    for pos in cuboid.iter() {
        area.set_block_material(pos, STONE, 1, Source::UNKNOWN);
    }
    area.finalize_tick(1);

    let positions: Vec<_> = cuboid.iter().collect();
    positions.par_iter().for_each(|&pos| {
        assert_eq!(area.read_snapshot(pos), CellWord::new(STONE, 1));
        area.set_block_data(pos, 2, Source::UNKNOWN);
        assert_eq!(area.read_snapshot(pos), CellWord::new(STONE, 1));
    });

    area.finalize_tick(2);
    assert!(
        cuboid
            .iter()
            .all(|pos| area.read_snapshot(pos) == CellWord::new(STONE, 2))
    );
}

#[test]
fn test_finalize_is_idempotent_without_writes() {
    let mut area = area(4);
    let pos = BlockPos::new(1, 2, 3);

    area.set_block_material(pos, SAND, 3, Source::UNKNOWN);
    area.finalize_tick(1);
    let first = area.read_snapshot(pos);

    assert!(area.finalize_tick(1).is_empty());
    assert_eq!(area.read_snapshot(pos), first);
    assert_eq!(area.store().generation(), 2);
}

#[test]
fn test_parallel_cas_counter() {
    let mut area = area(2);
    let pos = BlockPos::ZERO;

    (0..1000).into_par_iter().for_each(|_| {
        loop {
            let current = area.read_live(pos).data();
            if area.compare_and_set_data(pos, current, current + 1, Source::UNKNOWN) {
                break;
            }
        }
    });

    area.finalize_tick(1);
    assert_eq!(area.read_snapshot(pos).data(), 1000);
}

// ============================================================================
// Dynamic Updates
// ============================================================================

#[test]
fn test_insertion_policy_scenario() {
    let area = area(4);
    let pos = BlockPos::new(1, 1, 1);

    for due in [10, 20, 30] {
        assert!(area.queue_dynamic_update_at(pos, due));
    }
    assert!(area.queue_dynamic_update_with(pos, 25, InsertionPolicy::First, None));
    assert_eq!(area.updates().pending(pos), vec![20, 25, 30]);

    assert!(area.queue_dynamic_update_with(pos, 5, InsertionPolicy::All, None));
    assert_eq!(area.updates().pending(pos), vec![5]);

    assert!(area.queue_dynamic_update_with(pos, 40, InsertionPolicy::ReplaceNone, None));
    assert_eq!(area.updates().pending(pos), vec![5, 40]);
}

#[test]
fn test_drain_order_through_area() {
    let mut area = area(4);
    let a = BlockPos::new(0, 0, 0);
    let b = BlockPos::new(3, 3, 3);
    let c = BlockPos::new(2, 0, 1);

    area.queue_dynamic_update_with(a, 5, InsertionPolicy::ReplaceNone, Some(Hint::new("a")));
    area.queue_dynamic_update_with(b, 5, InsertionPolicy::ReplaceNone, Some(Hint::new("b")));
    area.queue_dynamic_update_with(c, 3, InsertionPolicy::ReplaceNone, Some(Hint::new("c")));

    assert!(area.finalize_tick(2).is_empty());
    let due = area.finalize_tick(5);

    let mut order = Vec::new();
    area.dispatch(&due, |pos, hint| {
        order.push((pos, *hint.unwrap().downcast_ref::<&str>().unwrap()));
    });
    assert_eq!(order, vec![(c, "c"), (a, "a"), (b, "b")]);
    assert!(area.updates().is_empty());
}

#[test]
fn test_material_change_clears_updates() {
    let area = area(4);
    let pos = BlockPos::new(2, 2, 2);

    area.queue_dynamic_update_at(pos, 3);
    area.queue_dynamic_update_at(pos, 9);
    assert_eq!(area.updates().len(), 2);

    area.set_block_material(pos, SAND, 0, Source::UNKNOWN);
    assert!(area.updates().is_empty());
}

#[test]
fn test_reset_dynamic_block() {
    let area = area(4);
    let pos = BlockPos::new(0, 3, 0);

    area.queue_dynamic_update(pos);
    area.update_block_physics(pos, Source::new(1));
    assert_eq!(area.reset_dynamic_block(pos), 2);
    assert!(!area.updates().has_pending(pos));
}

// ============================================================================
// Controllers
// ============================================================================

#[test]
fn test_dispatch_to_controllers() {
    let mut area = area(4);
    let hits = Arc::new(AtomicU32::new(0));
    let hits_clone = hits.clone();

    let id = area
        .controllers()
        .register(move |area: &AreaAccess, pos: BlockPos, hint: Option<&Hint>| {
            assert!(hint.is_some_and(|hint| hint.is::<PhysicsUpdate>()));
            area.set_block_light(pos, 15, Source::UNKNOWN);
            hits_clone.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

    let active = BlockPos::new(1, 0, 1);
    let passive = BlockPos::new(2, 0, 2);
    area.set_block_controller(active, Some(id), Source::UNKNOWN);

    area.update_block_physics(active, Source::UNKNOWN);
    area.update_block_physics(passive, Source::UNKNOWN);
    let due = area.finalize_tick(0);

    assert_eq!(area.dispatch_to_controllers(&due), 1);
    assert_eq!(hits.load(Ordering::Relaxed), 1);
    assert_eq!(area.read_live(active).block_light(), 15);
    assert_eq!(area.read_live(passive).block_light(), 0);
}

#[test]
fn test_unregistered_controller_is_skipped() {
    let mut area = area(4);
    let id = area
        .controllers()
        .register(|_: &AreaAccess, _: BlockPos, _: Option<&Hint>| {
            panic!("unregistered controller was called");
        })
        .unwrap();

    let pos = BlockPos::new(3, 0, 0);
    area.set_block_controller(pos, Some(id), Source::UNKNOWN);
    area.queue_dynamic_update(pos);
    let due = area.finalize_tick(0);

    area.controllers().unregister(id);
    assert_eq!(area.dispatch_to_controllers(&due), 0);
}

#[test]
fn test_shared_registry() {
    let registry = Arc::new(ControllerRegistry::new());
    let a = area(2).with_controllers(registry.clone());
    let b = area(2).with_controllers(registry.clone());

    let id = a
        .controllers()
        .register(|_: &AreaAccess, _: BlockPos, _: Option<&Hint>| {})
        .unwrap();
    assert!(b.controllers().get(id).is_some());
}

// ============================================================================
// Listeners
// ============================================================================

#[test]
fn test_listener_sees_source_and_kind() {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    let area = area(4).with_listener(move |change: &BlockChange| sink.lock().push(*change));

    let pos = BlockPos::new(1, 1, 1);
    let player = Source::new(77);

    area.block_with_source(pos, player).set_material(STONE, 0);
    area.set_block_sky_light(pos, 9, Source::UNKNOWN);
    assert!(!area.compare_and_set_data(pos, 5, 6, player));
    area.set_block_material(BlockPos::new(9, 9, 9), STONE, 0, player);

    let changes = changes.lock();
    assert_eq!(
        *changes,
        vec![
            BlockChange {
                pos,
                changed: ChangeKind::MATERIAL | ChangeKind::DATA,
                source: player,
            },
            BlockChange {
                pos,
                changed: ChangeKind::SKY_LIGHT,
                source: Source::UNKNOWN,
            },
        ]
    );
}

#[test]
fn test_listener_can_queue_for_new_material() {
    let slot: Arc<OnceLock<Weak<AreaAccess>>> = Arc::new(OnceLock::new());
    let listener_slot = slot.clone();
    let area = Arc::new(area(4).with_listener(move |change: &BlockChange| {
        if !change.changed.contains(ChangeKind::MATERIAL) {
            return;
        }
        if let Some(area) = listener_slot.get().and_then(Weak::upgrade) {
            assert!(area.queue_dynamic_update_at(change.pos, 3));
        }
    }));
    slot.set(Arc::downgrade(&area)).unwrap();

    let pos = BlockPos::new(2, 1, 2);
    area.queue_dynamic_update_at(pos, 8);

    assert!(area.set_block_material(pos, STONE, 0, Source::UNKNOWN));
    assert_eq!(area.updates().pending(pos), vec![3]);
}

// ============================================================================
// Coordinates and Configuration
// ============================================================================

#[test]
fn test_float_coordinates_floor() {
    let area = AreaAccess::with_cuboid(Cuboid::cube(BlockPos::new(-4, -4, -4), 8)).unwrap();

    let block = area.block_at(-0.1, 3.99, 0.0);
    assert_eq!(block.pos(), BlockPos::new(-1, 3, 0));
    assert!(block.set_data(4));
    assert_eq!(area.read_live(BlockPos::new(-1, 3, 0)).data(), 4);

    assert!(!area.block_at(4.0, 0.0, 0.0).exists());
}

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "base = [-8, 0, -8]").unwrap();
    writeln!(file, "size = [16, 32, 16]").unwrap();
    writeln!(file, "queue_shards = 4").unwrap();
    writeln!(file, "start_time = 20").unwrap();

    let config = AreaConfig::load(file.path()).unwrap();
    let area = AreaAccess::new(&config).unwrap();

    assert_eq!(area.cuboid(), &Cuboid::new(BlockPos::new(-8, 0, -8), 16, 32, 16));
    assert_eq!(area.updates().shard_count(), 4);
    assert_eq!(area.now(), 20);
    assert!(area.contains_block(BlockPos::new(7, 31, -8)));
    assert!(!area.contains_block(BlockPos::new(8, 0, 0)));
}

#[test]
fn test_missing_config_file() {
    assert!(matches!(
        AreaConfig::load("/nonexistent/area.toml"),
        Err(rgb_area::AreaError::Io(_))
    ));
}
