//! Property tests for the growth state machine and save records.

use std::sync::Arc;

use cropcraft_crops::{
    Bonuses, ConditionFailure, Crop, CropConfig, CropId, CropRecord, GrowthEngine, GrowthGate,
    PositionRecord,
};
use cropcraft_world::{GridWorld, WorldPos, WorldView};
use proptest::prelude::*;

struct Open;

impl GrowthGate for Open {
    fn can_grow(&self, _: &dyn WorldView, _: &WorldPos) -> Result<(), ConditionFailure> {
        Ok(())
    }
}

fn engine() -> (GrowthEngine<Open>, Arc<CropConfig>) {
    let config = Arc::new(CropConfig::oats());
    (GrowthEngine::new(config.clone(), Open), config)
}

proptest! {
    #[test]
    fn growth_never_passes_terminal_stage(
        steps in prop::collection::vec(0.0f64..500_000.0, 1..20),
        water in prop::bool::ANY,
        rain in prop::bool::ANY,
    ) {
        let (engine, config) = engine();
        let world = GridWorld::new();
        let bonuses = Bonuses {
            water: if water { config.water_bonus } else { 1.0 },
            rain: if rain { config.rain_bonus } else { 1.0 },
        };
        let mut crop = Crop::planted(CropId::new("p"), WorldPos::new("overworld", 0, 64, 0), 0, &config);

        let mut last_stage = crop.stage();
        let mut last_age = crop.total_age();
        for step in steps {
            engine.update_growth(&world, &mut crop, step, bonuses, 0).unwrap();
            prop_assert!(crop.stage() >= last_stage);
            prop_assert!(crop.stage() <= config.stage_count);
            prop_assert!(crop.total_age() >= last_age);
            prop_assert!(crop.stage_progress() >= 0.0);
            prop_assert!(crop.stage_progress() <= config.stage_duration(crop.stage()).unwrap());
            last_stage = crop.stage();
            last_age = crop.total_age();
        }
    }

    #[test]
    fn one_stage_plus_delta_leaves_delta(delta in 0.0f64..80_000.0) {
        let (engine, config) = engine();
        let world = GridWorld::new();
        let mut crop = Crop::planted(CropId::new("p"), WorldPos::new("overworld", 0, 64, 0), 0, &config);
        let duration = config.stage_duration(1).unwrap();

        engine.update_growth(&world, &mut crop, duration + delta, Bonuses::NONE, 0).unwrap();
        prop_assert_eq!(crop.stage(), 2);
        prop_assert!((crop.stage_progress() - delta).abs() < 1e-6);
    }

    #[test]
    fn record_roundtrip_reproduces_state(
        id in "[a-z]{1,8}-[0-9a-f]{16}",
        world in "[a-z_]{1,12}",
        x in -30_000_000i32..30_000_000,
        y in -64i32..320,
        z in -30_000_000i32..30_000_000,
        stage in 1u32..=4,
        progress in 0.0f64..86_400.0,
        age in 0.0f64..1.0e9,
        planted_at in 0i64..4_000_000_000_000,
        updated_by in 0i64..1_000_000_000,
    ) {
        let config = CropConfig::oats();
        let pos = WorldPos::new(world, x, y, z);
        let record = CropRecord {
            id,
            position: PositionRecord::from(&pos),
            stage,
            stage_progress: progress,
            total_age: age,
            planted_at,
            last_update_time: planted_at + updated_by,
        };

        let crop = Crop::from_record(record.clone(), &config).unwrap();

        prop_assert_eq!(crop.id().as_str(), record.id.as_str());
        prop_assert_eq!(crop.position(), &pos);
        prop_assert_eq!(crop.stage(), stage);
        prop_assert_eq!(crop.stage_progress(), progress);
        prop_assert_eq!(crop.total_age(), age);
        prop_assert_eq!(crop.planted_at(), planted_at);
        prop_assert_eq!(crop.last_update_time(), planted_at + updated_by);
        prop_assert_eq!(crop.to_record(), record.clone());

        let json = serde_json::to_string(&record).unwrap();
        let decoded: CropRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&decoded.id, &record.id);
        prop_assert_eq!(&decoded.position, &record.position);
        prop_assert_eq!(decoded.stage, stage);
        prop_assert!((decoded.stage_progress - progress).abs() <= progress.abs() * 1e-12);
        prop_assert!((decoded.total_age - age).abs() <= age.abs() * 1e-12);
    }
}
