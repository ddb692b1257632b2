//! The crop system: planting, ticking, harvesting and chunk streaming.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cropcraft_core::{Clock, SystemClock};
use cropcraft_world::{ChunkPos, Weather, WorldPos, WorldView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::StorageBackend;
use crate::bonus::BonusCalculator;
use crate::config::{ConfigError, CropConfig};
use crate::crop::{Crop, CropId};
use crate::growth::{GrowthEngine, GrowthOutcome, StageChange};
use crate::harvest::{HarvestRecord, YieldCalculator};
use crate::persist::{ChunkCropBundle, PersistenceError, PersistenceManager};
use crate::validator::{ConditionFailure, ConditionValidator};

/// Why a seed could not be planted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlantError {
    /// A crop already stands there.
    #[error("a crop is already planted at {position}")]
    AlreadyPlanted {
        /// Requested position.
        position: WorldPos,
    },
    /// The block below is not a valid soil.
    #[error("cannot plant at {position}: {reason}")]
    InvalidSoil {
        /// Requested position.
        position: WorldPos,
        /// Validator explanation.
        #[source]
        reason: ConditionFailure,
    },
    /// The species cannot live in this biome.
    #[error("{species} cannot grow in biome `{biome}` at {position}")]
    InvalidBiome {
        /// Requested position.
        position: WorldPos,
        /// Biome at the position.
        biome: String,
        /// Species being planted.
        species: String,
    },
    /// The planting cell itself is blocked.
    #[error("cannot plant at {position}: occupied by `{block}`")]
    ObstructedSpace {
        /// Requested position.
        position: WorldPos,
        /// Block in the way.
        block: String,
    },
}

impl PlantError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyPlanted { .. } => "ALREADY_PLANTED",
            Self::InvalidSoil { .. } => "INVALID_SOIL",
            Self::InvalidBiome { .. } => "INVALID_BIOME",
            Self::ObstructedSpace { .. } => "OBSTRUCTED_SPACE",
        }
    }
}

/// What one tick did to the crop population.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Crops that received progress.
    pub updated: usize,
    /// Crops whose growth conditions failed.
    pub suspended: usize,
    /// Crops already at their terminal stage.
    pub mature: usize,
    /// Crops skipped because their state was invalid.
    pub failed: usize,
    /// Stage transitions, in position order.
    pub stage_changes: Vec<StageChange>,
    /// Mature crops due a particle burst.
    pub particle_bursts: Vec<WorldPos>,
}

/// Outcome of restoring one chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkLoadReport {
    /// Chunk that was loaded.
    pub chunk: ChunkPos,
    /// Crops put back into the world.
    pub restored: usize,
    /// Saved crops that could not be restored.
    pub skipped: usize,
    /// Saved crops whose position was already occupied in memory.
    pub already_present: usize,
    /// When the bundle was written, if recorded.
    pub last_saved: Option<i64>,
}

/// Outcome of [`CropSystem::save_all`].
#[derive(Debug, Default)]
pub struct SaveSummary {
    /// Chunks written.
    pub saved_chunks: usize,
    /// Crops written across all chunks.
    pub saved_crops: usize,
    /// Emptied chunks whose stale save was removed.
    pub cleared_chunks: usize,
    /// Chunks that could not be written.
    pub failures: Vec<PersistenceError>,
}

/// Owns every live crop of one species and drives it through its lifecycle.
///
/// Crops are grouped by chunk so streaming a chunk in or out touches only
/// that chunk's entries. Iteration is in chunk then position order, which
/// keeps ticks and saves deterministic for a given seed.
#[derive(Debug)]
pub struct CropSystem {
    config: Arc<CropConfig>,
    validator: ConditionValidator,
    bonuses: BonusCalculator,
    growth: GrowthEngine,
    yields: YieldCalculator,
    persistence: PersistenceManager,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    crops: BTreeMap<ChunkPos, BTreeMap<WorldPos, Crop>>,
    /// Chunks whose storage key this system owns: loaded or planted into.
    tracked: BTreeSet<ChunkPos>,
    /// Tracked chunks whose saved crops have been read into memory. A chunk
    /// only planted into must be read back before its key is written.
    restored: BTreeSet<ChunkPos>,
}

impl CropSystem {
    /// Build a system on the system clock.
    pub fn new(
        config: CropConfig,
        backend: Arc<dyn StorageBackend>,
        world_seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(config, backend, world_seed, Arc::new(SystemClock))
    }

    /// Build a system reading timestamps from `clock`.
    pub fn with_clock(
        config: CropConfig,
        backend: Arc<dyn StorageBackend>,
        world_seed: u64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let validator = ConditionValidator::new(config.clone());
        Ok(Self {
            growth: GrowthEngine::new(config.clone(), validator.clone()),
            bonuses: BonusCalculator::new(config.clone()),
            yields: YieldCalculator::new(config.clone()),
            persistence: PersistenceManager::new(config.species.clone(), backend, clock.clone()),
            validator,
            clock,
            rng: StdRng::seed_from_u64(world_seed),
            crops: BTreeMap::new(),
            tracked: BTreeSet::new(),
            restored: BTreeSet::new(),
            config,
        })
    }

    /// Species configuration.
    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Condition checks used for planting and growth.
    pub fn validator(&self) -> &ConditionValidator {
        &self.validator
    }

    /// Water and rain detection.
    pub fn bonus_calculator(&self) -> &BonusCalculator {
        &self.bonuses
    }

    /// Stage state machine.
    pub fn growth_engine(&self) -> &GrowthEngine {
        &self.growth
    }

    /// Harvest rolls.
    pub fn yield_calculator(&self) -> &YieldCalculator {
        &self.yields
    }

    /// Chunk save/restore.
    pub fn persistence(&self) -> &PersistenceManager {
        &self.persistence
    }

    /// Plant a seed at `pos`.
    ///
    /// Checks run in a fixed order and the first failure wins: occupancy,
    /// soil, biome, then space at the planting cell.
    pub fn plant_seed(&mut self, world: &dyn WorldView, pos: WorldPos) -> Result<&Crop, PlantError> {
        let chunk = pos.chunk();
        if self.get_crop(&pos).is_some() {
            return Err(PlantError::AlreadyPlanted { position: pos });
        }
        if let Err(reason) = self.validator.can_plant(world, &pos) {
            return Err(PlantError::InvalidSoil { position: pos, reason });
        }
        let biome = world.biome(&pos);
        if self.config.incompatible_biomes.contains(biome) {
            return Err(PlantError::InvalidBiome {
                biome: biome.to_string(),
                species: self.config.species.clone(),
                position: pos,
            });
        }
        if !self.validator.has_space_above(world, &pos, false) {
            return Err(PlantError::ObstructedSpace {
                block: world.block_type(&pos).to_string(),
                position: pos,
            });
        }

        let id = CropId::new(format!("{}-{:016x}", self.config.species, self.rng.gen::<u64>()));
        let crop = Crop::planted(id, pos.clone(), self.clock.now_millis(), &self.config);
        debug!(crop = %crop.id(), position = %pos, "Planted crop");

        self.tracked.insert(chunk);
        Ok(self
            .crops
            .entry(chunk)
            .or_default()
            .entry(pos)
            .or_insert(crop))
    }

    /// Advance every crop by `delta_seconds`.
    ///
    /// A crop that cannot be updated is logged and skipped; the rest of the
    /// batch still runs.
    pub fn on_tick(&mut self, world: &dyn WorldView, weather: &Weather, delta_seconds: f64) -> TickReport {
        let now = self.clock.now_millis();
        let interval = self.config.particle_interval;
        let mut report = TickReport::default();

        for crop in self.crops.values_mut().flat_map(BTreeMap::values_mut) {
            let bonuses = self.bonuses.calculate_bonuses(world, &crop.position, weather);
            match self.growth.update_growth(world, crop, delta_seconds, bonuses, now) {
                Ok(GrowthOutcome::Grew {
                    from_stage,
                    to_stage,
                    ..
                }) => {
                    report.updated += 1;
                    if to_stage != from_stage {
                        report.stage_changes.push(StageChange {
                            position: crop.position.clone(),
                            from: from_stage,
                            to: to_stage,
                        });
                    }
                }
                Ok(GrowthOutcome::Suspended(reason)) => {
                    report.suspended += 1;
                    debug!(crop = %crop.id, %reason, "Growth suspended");
                }
                Ok(GrowthOutcome::AtMaturity) => report.mature += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(error = %err, "Skipping crop update");
                    continue;
                }
            }

            if self.config.is_mature(crop.stage) && interval.is_finite() && interval > 0.0 {
                crop.particle_timer += delta_seconds.max(0.0);
                if crop.particle_timer >= interval {
                    crop.particle_timer %= interval;
                    report.particle_bursts.push(crop.position.clone());
                }
            }
        }

        report
    }

    /// Harvest the crop at `pos`, removing it whatever its stage.
    ///
    /// Returns `None` when nothing is planted there.
    pub fn on_plant_harvested(&mut self, pos: &WorldPos, enchantment_level: i32) -> Option<HarvestRecord> {
        let crop = self.remove_crop(pos)?;
        let yields = self.yields.calculate(crop.stage, enchantment_level, &mut self.rng);
        let record = HarvestRecord {
            mature: crop.is_mature(&self.config),
            items: self.yields.to_stacks(yields),
            crop_id: crop.id,
            position: crop.position,
            stage: crop.stage,
            enchantment_level,
            yields,
            total_age: crop.total_age,
            harvested_at: self.clock.now_millis(),
        };
        debug!(
            crop = %record.crop_id,
            stage = record.stage,
            primary = yields.primary,
            seeds = yields.seeds,
            "Harvested crop"
        );
        Some(record)
    }

    /// Destroy the crop at `pos` without a yield.
    pub fn remove_crop(&mut self, pos: &WorldPos) -> Option<Crop> {
        let chunk = pos.chunk();
        let crops = self.crops.get_mut(&chunk)?;
        let crop = crops.remove(pos);
        if crops.is_empty() {
            self.crops.remove(&chunk);
        }
        crop
    }

    /// The crop at `pos`, if any.
    pub fn get_crop(&self, pos: &WorldPos) -> Option<&Crop> {
        self.crops.get(&pos.chunk())?.get(pos)
    }

    /// Every live crop, in chunk then position order.
    pub fn crops(&self) -> impl Iterator<Item = &Crop> {
        self.crops.values().flat_map(BTreeMap::values)
    }

    /// Number of live crops.
    pub fn crop_count(&self) -> usize {
        self.crops.values().map(BTreeMap::len).sum()
    }

    /// Live crops in `chunk`.
    pub fn crops_in_chunk(&self, chunk: ChunkPos) -> impl Iterator<Item = &Crop> {
        self.crops.get(&chunk).into_iter().flat_map(BTreeMap::values)
    }

    /// Chunks this system has loaded or planted into and not yet unloaded.
    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.tracked.iter().copied()
    }

    /// Restore the crops saved for `chunk`.
    ///
    /// Records that fail validation, or that lie outside `chunk`, are skipped
    /// with a warning. A position already occupied in memory keeps the live
    /// crop.
    pub async fn on_chunk_load(&mut self, chunk: ChunkPos) -> Result<ChunkLoadReport, PersistenceError> {
        let loaded = self.persistence.load_chunk(chunk).await?;
        let mut report = ChunkLoadReport {
            chunk,
            restored: 0,
            skipped: loaded.skipped_records,
            already_present: 0,
            last_saved: loaded.bundle.last_saved,
        };

        for record in loaded.bundle.crops {
            let crop = match Crop::from_record(record, &self.config) {
                Ok(crop) => crop,
                Err(err) => {
                    report.skipped += 1;
                    warn!(chunk = %chunk, error = %err, "Skipping saved crop");
                    continue;
                }
            };
            if crop.chunk() != chunk {
                report.skipped += 1;
                warn!(chunk = %chunk, crop = %crop.id, position = %crop.position, "Saved crop lies outside its chunk");
                continue;
            }
            let slot = self.crops.entry(chunk).or_default();
            if slot.contains_key(&crop.position) {
                report.already_present += 1;
                continue;
            }
            slot.insert(crop.position.clone(), crop);
            report.restored += 1;
        }

        self.tracked.insert(chunk);
        self.restored.insert(chunk);
        if self.crops.get(&chunk).is_some_and(BTreeMap::is_empty) {
            self.crops.remove(&chunk);
        }
        info!(
            chunk = %chunk,
            restored = report.restored,
            skipped = report.skipped,
            "Loaded crop chunk"
        );
        Ok(report)
    }

    /// Read back the saved crops of a chunk that was planted into without
    /// being loaded, so the next write keeps them. Live crops win conflicts.
    ///
    /// Fails, leaving storage untouched, when the saved bundle cannot be read.
    async fn reconcile(&mut self, chunk: ChunkPos) -> Result<(), PersistenceError> {
        if self.tracked.contains(&chunk) && !self.restored.contains(&chunk) {
            self.on_chunk_load(chunk).await?;
        }
        Ok(())
    }

    /// Save and drop every crop in `chunk`, returning how many left memory.
    ///
    /// If the save fails the crops stay loaded. Unloading a chunk this system
    /// owns but that no longer holds crops deletes its stale save. A chunk
    /// whose saved bundle cannot be read is never overwritten.
    pub async fn on_chunk_unload(&mut self, chunk: ChunkPos) -> Result<usize, PersistenceError> {
        if !self.tracked.contains(&chunk) {
            return Ok(0);
        }
        self.reconcile(chunk).await?;

        let records: Vec<_> = self.crops_in_chunk(chunk).map(Crop::to_record).collect();
        if records.is_empty() {
            self.persistence.delete_chunk(chunk).await?;
            self.untrack(chunk);
            return Ok(0);
        }

        let mut bundle = ChunkCropBundle::new(chunk, records);
        self.persistence.save_chunk(&mut bundle).await?;
        let removed = self.crops.remove(&chunk).map_or(0, |crops| crops.len());
        self.untrack(chunk);
        info!(chunk = %chunk, crops = removed, "Unloaded crop chunk");
        Ok(removed)
    }

    fn untrack(&mut self, chunk: ChunkPos) {
        self.tracked.remove(&chunk);
        self.restored.remove(&chunk);
    }

    async fn write_chunk(&mut self, chunk: ChunkPos, summary: &mut SaveSummary) -> Result<(), PersistenceError> {
        self.reconcile(chunk).await?;
        let records: Vec<_> = self.crops_in_chunk(chunk).map(Crop::to_record).collect();
        if records.is_empty() {
            if self.persistence.delete_chunk(chunk).await? {
                summary.cleared_chunks += 1;
            }
        } else {
            let count = records.len();
            let mut bundle = ChunkCropBundle::new(chunk, records);
            self.persistence.save_chunk(&mut bundle).await?;
            summary.saved_chunks += 1;
            summary.saved_crops += count;
        }
        Ok(())
    }

    /// Save every owned chunk without unloading anything.
    ///
    /// Chunks planted into but never loaded have their saved crops read back
    /// into memory first.
    pub async fn save_all(&mut self) -> SaveSummary {
        let mut summary = SaveSummary::default();
        let chunks: Vec<ChunkPos> = self.tracked.iter().copied().collect();
        for chunk in chunks {
            if let Err(err) = self.write_chunk(chunk, &mut summary).await {
                warn!(error = %err, "Failed to save crop chunk");
                summary.failures.push(err);
            }
        }
        info!(
            chunks = summary.saved_chunks,
            crops = summary.saved_crops,
            failures = summary.failures.len(),
            "Saved crops"
        );
        summary
    }
}
