//! End-to-end crop lifecycle against an in-memory world.

use std::sync::Arc;

use cropcraft_core::ManualClock;
use cropcraft_crops::{
    Bonuses, ConditionValidator, Crop, CropConfig, CropId, CropSystem, GrowthEngine, GrowthOutcome,
    MemoryBackend,
};
use cropcraft_world::{blocks, GridWorld, Weather, WorldPos, WorldView};

const DAY: f64 = 86_400.0;

fn at(x: i32, y: i32, z: i32) -> WorldPos {
    WorldPos::new("overworld", x, y, z)
}

fn farm() -> GridWorld {
    let mut world = GridWorld::new();
    for x in -8..8 {
        for z in -8..8 {
            world.set_block(at(x, 63, z), blocks::FARMLAND);
        }
    }
    world
}

fn oats_system() -> CropSystem {
    CropSystem::with_clock(
        CropConfig::oats(),
        Arc::new(MemoryBackend::new()),
        2024,
        Arc::new(ManualClock::new(0)),
    )
    .unwrap()
}

#[test]
fn non_tilled_soil_rejects_planting() {
    let mut world = farm();
    world.set_block(at(0, 63, 0), blocks::DIRT);
    let mut system = oats_system();

    let err = system.plant_seed(&world, at(0, 64, 0)).unwrap_err();
    assert_eq!(err.code(), "INVALID_SOIL");
    assert!(system.get_crop(&at(0, 64, 0)).is_none());
    assert_eq!(system.crop_count(), 0);
}

#[test]
fn full_lifecycle_reaches_terminal_stage_and_harvests() {
    let world = farm();
    let mut system = oats_system();
    system.plant_seed(&world, at(1, 64, 1)).unwrap();

    let mut seen = vec![1];
    for _ in 0..4 {
        system.on_tick(&world, &Weather::clear(), DAY);
        seen.push(system.get_crop(&at(1, 64, 1)).unwrap().stage());
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 4]);

    let record = system.on_plant_harvested(&at(1, 64, 1), 0).unwrap();
    assert!(record.mature);
    assert!((1..=2).contains(&record.yields.primary));
    assert!((1..=2).contains(&record.yields.seeds));
    assert!(system.get_crop(&at(1, 64, 1)).is_none());
}

#[test]
fn water_and_rain_combine_additively_during_ticks() {
    let mut world = farm();
    world.set_block(at(3, 64, 0), blocks::WATER);
    let mut system = oats_system();
    let pos = at(0, 64, 0);
    system.plant_seed(&world, pos.clone()).unwrap();

    let bonuses = system
        .bonus_calculator()
        .calculate_bonuses(&world, &pos, &Weather::raining());
    assert_eq!(bonuses.water, 1.15);
    assert_eq!(bonuses.rain, 1.10);
    assert!((bonuses.multiplier() - 1.25).abs() < 1e-12);

    system.on_tick(&world, &Weather::raining(), 1_000.0);
    let crop = system.get_crop(&pos).unwrap();
    assert!((crop.stage_progress() - 1_250.0).abs() < 1e-9);
    assert!((crop.total_age() - 1_250.0).abs() < 1e-9);
}

#[test]
fn roof_blocks_rain_but_not_water() {
    let mut world = farm();
    world.set_block(at(0, 70, 0), blocks::STONE);
    world.set_block(at(0, 64, 2), blocks::WATER);
    let system = oats_system();
    let pos = at(0, 64, 0);

    let bonuses = system
        .bonus_calculator()
        .calculate_bonuses(&world, &pos, &Weather::raining());
    assert_eq!(bonuses.rain, 1.0);
    assert_eq!(bonuses.water, 1.15);
}

#[test]
fn obstruction_above_suspends_growth_without_losing_progress() {
    let mut world = farm();
    let mut system = oats_system();
    let pos = at(2, 64, 2);
    system.plant_seed(&world, pos.clone()).unwrap();
    system.on_tick(&world, &Weather::clear(), 1_000.0);

    world.set_block(pos.up(), blocks::STONE);
    let report = system.on_tick(&world, &Weather::clear(), DAY);
    assert_eq!(report.suspended, 1);
    assert_eq!(system.get_crop(&pos).unwrap().stage_progress(), 1_000.0);

    world.set_block(pos.up(), blocks::AIR);
    system.on_tick(&world, &Weather::clear(), 1_000.0);
    assert_eq!(system.get_crop(&pos).unwrap().stage_progress(), 2_000.0);
}

#[test]
fn terminal_stage_with_a_full_stage_of_time_stays_put() {
    let config = Arc::new(CropConfig::oats());
    let engine = GrowthEngine::new(config.clone(), ConditionValidator::new(config.clone()));
    let world = farm();
    let pos = at(0, 64, 0);

    let mut crop = Crop::planted(CropId::new("oats-terminal"), pos, 0, &config);
    engine
        .update_growth(&world, &mut crop, 3.0 * DAY, Bonuses::NONE, 0)
        .unwrap();
    assert_eq!(crop.stage(), 4);
    assert_eq!(crop.stage_progress(), 0.0);

    let outcome = engine
        .update_growth(&world, &mut crop, 4.0 * DAY, Bonuses::NONE, 0)
        .unwrap();
    assert_eq!(outcome, GrowthOutcome::AtMaturity);
    assert_eq!(crop.stage(), 4);
    assert_eq!(crop.stage_progress(), 0.0);
}

#[test]
fn glowcap_grows_in_the_dark() {
    let mut world = GridWorld::new();
    world.set_skylight(0);
    world.set_block(at(0, 63, 0), blocks::MYCELIUM);
    world.set_block(at(0, 80, 0), blocks::STONE);
    assert_eq!(world.light_level(&at(0, 64, 0)), 0);

    let mut system = CropSystem::with_clock(
        CropConfig::glowcap(),
        Arc::new(MemoryBackend::new()),
        5,
        Arc::new(ManualClock::new(0)),
    )
    .unwrap();
    system.plant_seed(&world, at(0, 64, 0)).unwrap();
    let report = system.on_tick(&world, &Weather::clear(), 2.0 * DAY);
    assert_eq!(report.suspended, 0);
    assert!(system.get_crop(&at(0, 64, 0)).unwrap().stage() > 1);
}

#[test]
fn desert_rejects_oats() {
    let mut world = farm();
    world.set_biome("overworld", 4, 4, "desert");
    let mut system = oats_system();
    let err = system.plant_seed(&world, at(4, 64, 4)).unwrap_err();
    assert_eq!(err.code(), "INVALID_BIOME");
    assert!(err.to_string().contains("desert"));
}
