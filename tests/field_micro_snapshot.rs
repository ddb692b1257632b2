use std::path::PathBuf;
use std::sync::Arc;

use cropcraft_core::ManualClock;
use cropcraft_crops::{CropConfig, CropSystem, MemoryBackend};
use cropcraft_testkit::{run_micro_worldtest, FarmPlot, MicroWorldtestConfig};
use cropcraft_world::{blocks, GridWorld, Weather, WorldPos};
use serde::Serialize;

fn snapshot_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/snapshots")
        .join(name)
}

struct State {
    world: GridWorld,
    system: CropSystem,
    suspended: usize,
}

#[derive(Serialize)]
struct Snap {
    stages: Vec<u32>,
    suspended: usize,
}

/// Three oats in a row: one beside water, one under a roof, one dry.
#[test]
fn oats_field_micro_snapshot() {
    let plot = FarmPlot::new("overworld").size(10, 1).water_at(0, 0);
    let mut world = plot.build();
    world.set_block(WorldPos::new("overworld", 5, 70, 0), blocks::STONE);

    let mut system = CropSystem::with_clock(
        CropConfig::oats(),
        Arc::new(MemoryBackend::new()),
        1,
        Arc::new(ManualClock::new(0)),
    )
    .unwrap();
    for x in [1, 5, 9] {
        system
            .plant_seed(&world, WorldPos::new("overworld", x, 64, 0))
            .unwrap();
    }

    run_micro_worldtest(
        MicroWorldtestConfig {
            name: "oats_field_micro".into(),
            ticks: 8,
            tick_seconds: 43_200.0,
            snapshot_path: snapshot_path("oats_field_micro.json"),
        },
        State {
            world,
            system,
            suspended: 0,
        },
        |_, seconds, state| {
            let report = state.system.on_tick(&state.world, &Weather::clear(), seconds);
            state.suspended = report.suspended;
        },
        |_, state| Snap {
            stages: state.system.crops().map(|crop| crop.stage()).collect(),
            suspended: state.suspended,
        },
    )
    .expect("snapshot matches");
}
