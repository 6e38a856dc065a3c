//! Reference tick driver for RGB areas
//!
//! This binary:
//! 1. Builds an area from `AREA_CONFIG` (TOML) or the defaults
//! 2. Seeds it with a stone floor, crops and falling sand
//! 3. Runs `TICKS` ticks, simulating on a `WORKERS`-thread pool
//!
//! Each tick is simulate (parallel) → finalize → dispatch.

mod simulation;

use std::time::Duration;

use rgb_area::{AreaAccess, AreaConfig};
use tracing::{debug, info};

use crate::simulation::{register_crop, run_tick, seed};

/// Ticks between progress reports.
const REPORT_EVERY: u64 = 20;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rgb_sim=info".parse()?)
                .add_directive("rgb_area=info".parse()?),
        )
        .init();

    // Configuration
    let config = match std::env::var("AREA_CONFIG") {
        Ok(path) => {
            info!("Loading area config from {}", path);
            AreaConfig::load(&path)?
        }
        Err(_) => AreaConfig::default(),
    };

    let ticks: u64 = std::env::var("TICKS")
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(200);

    // 0 lets rayon pick one thread per core
    let workers: usize = std::env::var("WORKERS")
        .ok()
        .and_then(|w| w.parse().ok())
        .unwrap_or(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("rgb-sim-{i}"))
        .build()?;

    let mut area = AreaAccess::new(&config)?;
    let crop = register_crop(&area)?;
    let crops = seed(&area, crop);

    let start = area.now();
    area.finalize_tick(start);

    info!(
        "Seeded {} with {} crops, running {} ticks on {} workers",
        area.cuboid(),
        crops,
        ticks,
        pool.current_num_threads()
    );

    let mut moved = 0;
    let mut delivered = 0;
    let mut busy = Duration::ZERO;

    for _ in 0..ticks {
        let stats = run_tick(&mut area, &pool);
        moved += stats.moved;
        delivered += stats.delivered;
        busy += stats.elapsed;

        if stats.tick % REPORT_EVERY == 0 {
            info!(
                tick = stats.tick,
                moved = stats.moved,
                drained = stats.drained,
                delivered = stats.delivered,
                pending = stats.pending,
                elapsed = ?stats.elapsed,
                "tick"
            );
        } else {
            debug!(?stats, "tick");
        }
    }

    info!(
        ticks,
        moved,
        delivered,
        pending = area.updates().len(),
        avg = ?busy.checked_div(ticks as u32).unwrap_or_default(),
        "Simulation finished"
    );

    Ok(())
}
