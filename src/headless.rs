//! Headless farm simulation.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cropcraft_crops::{CropConfig, CropSystem, FileBackend};
use cropcraft_world::{blocks, BlockPos, ChunkPos, DayCycle, GridWorld, WeatherCycle, WorldPos};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SimConfig;

#[derive(Debug, Default, Serialize)]
pub struct HarvestSummary {
    pub crops: usize,
    pub mature: usize,
    pub items: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Serialize)]
pub struct SimSummary {
    pub species: String,
    pub ticks: u64,
    pub simulated_seconds: f64,
    pub planted: usize,
    pub plant_failures: BTreeMap<&'static str, usize>,
    pub stage_changes: usize,
    pub suspended_updates: usize,
    pub failed_updates: usize,
    pub particle_bursts: usize,
    pub weather_changes: usize,
    pub rainy_ticks: u64,
    pub chunk_unloads: usize,
    pub crops_restored: usize,
    pub crops_skipped: usize,
    pub stages: BTreeMap<u32, usize>,
    pub harvest: HarvestSummary,
}

/// Soil plot centred on the origin, optionally with a water channel along x=0.
pub fn build_plot(cfg: &SimConfig, crop: &CropConfig) -> GridWorld {
    let soil = crop
        .valid_soils
        .iter()
        .next()
        .map(String::as_str)
        .unwrap_or(blocks::FARMLAND);
    let (x0, z0) = (-cfg.plot_width / 2, -cfg.plot_depth / 2);
    let (x1, z1) = (x0 + cfg.plot_width - 1, z0 + cfg.plot_depth - 1);

    let mut world = GridWorld::new();
    world.fill(&cfg.world, BlockPos::new(x0, 63, z0), BlockPos::new(x1, 63, z1), soil);
    if cfg.irrigate {
        world.fill(&cfg.world, BlockPos::new(0, 64, z0), BlockPos::new(0, 64, z1), blocks::WATER);
    }
    world
}

fn plot_cells(cfg: &SimConfig) -> impl Iterator<Item = WorldPos> + '_ {
    let (x0, z0) = (-cfg.plot_width / 2, -cfg.plot_depth / 2);
    (x0..x0 + cfg.plot_width).flat_map(move |x| {
        (z0..z0 + cfg.plot_depth).map(move |z| WorldPos::new(cfg.world.as_str(), x, 64, z))
    })
    .filter(move |pos| !(cfg.irrigate && pos.x == 0))
}

pub async fn run(cfg: &SimConfig) -> Result<SimSummary> {
    let crop = cfg.crop_config()?;
    let mut world = build_plot(cfg, &crop);
    let backend = Arc::new(FileBackend::new(&cfg.save_dir)?);
    let mut system = CropSystem::new(crop.clone(), backend, cfg.world_seed)
        .with_context(|| format!("Invalid configuration for {}", crop.species))?;

    let mut summary = SimSummary {
        species: crop.species.clone(),
        ticks: cfg.ticks,
        ..SimSummary::default()
    };

    for pos in plot_cells(cfg) {
        match system.plant_seed(&world, pos) {
            Ok(_) => summary.planted += 1,
            Err(err) => *summary.plant_failures.entry(err.code()).or_default() += 1,
        }
    }
    info!(planted = summary.planted, species = %crop.species, "Field planted");

    let mut weather = WeatherCycle::new(
        cfg.world_seed,
        (cfg.clear_spell[0], cfg.clear_spell[1]),
        (cfg.rain_spell[0], cfg.rain_spell[1]),
    );
    let mut day = DayCycle::new(cfg.seconds_per_day);

    for tick in 1..=cfg.ticks {
        if weather.advance(cfg.tick_seconds).is_some() {
            summary.weather_changes += 1;
        }
        day.advance(cfg.tick_seconds);
        let current = weather.weather();
        if current.is_raining() {
            summary.rainy_ticks += 1;
        }
        world.set_skylight(day.skylight(&current));

        let report = system.on_tick(&world, &current, cfg.tick_seconds);
        summary.stage_changes += report.stage_changes.len();
        summary.suspended_updates += report.suspended;
        summary.failed_updates += report.failed;
        summary.particle_bursts += report.particle_bursts.len();

        if cfg.stream_every > 0 && tick % cfg.stream_every == 0 {
            stream_chunks(&mut system, &mut summary).await;
        }
    }
    summary.simulated_seconds = cfg.ticks as f64 * cfg.tick_seconds;

    let saved = system.save_all().await;
    if !saved.failures.is_empty() {
        warn!(failures = saved.failures.len(), "Some chunks failed to save");
    }

    for crop in system.crops() {
        *summary.stages.entry(crop.stage()).or_default() += 1;
    }
    let positions: Vec<_> = system.crops().map(|crop| crop.position().clone()).collect();
    for pos in positions {
        if let Some(record) = system.on_plant_harvested(&pos, cfg.fortune_level) {
            summary.harvest.crops += 1;
            if record.mature {
                summary.harvest.mature += 1;
            }
            for stack in record.items {
                *summary.harvest.items.entry(stack.item).or_default() += stack.count;
            }
        }
    }
    let cleared: Vec<ChunkPos> = system.loaded_chunks().collect();
    for chunk in cleared {
        if let Err(err) = system.on_chunk_unload(chunk).await {
            warn!(error = %err, "Failed to clear harvested chunk");
        }
    }

    info!(
        harvested = summary.harvest.crops,
        mature = summary.harvest.mature,
        "Simulation finished"
    );
    Ok(summary)
}

async fn stream_chunks(system: &mut CropSystem, summary: &mut SimSummary) {
    let chunks: Vec<ChunkPos> = system.loaded_chunks().collect();
    let mut unloaded = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match system.on_chunk_unload(chunk).await {
            Ok(_) => {
                summary.chunk_unloads += 1;
                unloaded.push(chunk);
            }
            Err(err) => warn!(error = %err, "Chunk unload failed; keeping crops loaded"),
        }
    }
    for chunk in unloaded {
        match system.on_chunk_load(chunk).await {
            Ok(report) => {
                summary.crops_restored += report.restored;
                summary.crops_skipped += report.skipped;
            }
            Err(err) => warn!(error = %err, code = err.code(), "Chunk load failed"),
        }
    }
}

/// Remove save files left by a previous run.
pub fn reset_save_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear save directory {}", dir.display()))?;
    }
    Ok(())
}
