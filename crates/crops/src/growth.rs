//! Stage-progression state machine.
//!
//! A crop moves through stages `1..=stage_count`. Each stage lasts
//! `base_growth_time * stage_distribution[stage - 1]` seconds of bonus-scaled
//! time. Progress past a stage boundary carries into the next stage, so one
//! large step can cross several stages. The last stage is terminal: it keeps
//! at most one stage's worth of progress and never accumulates more.

use std::sync::Arc;

use cropcraft_world::{WorldPos, WorldView};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::bonus::Bonuses;
use crate::config::CropConfig;
use crate::crop::{Crop, CropId};
use crate::validator::{ConditionFailure, ConditionValidator, GrowthGate};

/// What one growth update did.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthOutcome {
    /// Conditions failed; progress was left untouched.
    Suspended(ConditionFailure),
    /// The crop was already at its terminal stage.
    AtMaturity,
    /// Progress was applied.
    Grew {
        /// Stage before the update.
        from_stage: u32,
        /// Stage after the update.
        to_stage: u32,
        /// Bonus-scaled seconds applied.
        progress: f64,
    },
}

impl GrowthOutcome {
    /// Number of stage boundaries crossed.
    pub fn stages_advanced(&self) -> u32 {
        match self {
            GrowthOutcome::Grew {
                from_stage,
                to_stage,
                ..
            } => to_stage - from_stage,
            _ => 0,
        }
    }
}

/// A crop in a state the engine refuses to advance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    /// Stage outside `1..=stage_count`.
    #[error("crop {id} at {position} is at stage {stage}, outside 1..={stage_count}")]
    StageOutOfRange {
        /// Offending crop.
        id: CropId,
        /// Its position.
        position: WorldPos,
        /// Its stage.
        stage: u32,
        /// Species stage count.
        stage_count: u32,
    },
    /// Elapsed time times bonuses was NaN or infinite.
    #[error("crop {id} at {position} received non-finite progress {progress}")]
    NonFiniteProgress {
        /// Offending crop.
        id: CropId,
        /// Its position.
        position: WorldPos,
        /// The progress value.
        progress: f64,
    },
}

/// One stage transition, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageChange {
    /// Crop that advanced.
    pub position: WorldPos,
    /// Stage before.
    pub from: u32,
    /// Stage after.
    pub to: u32,
}

/// Advances crops through their stages, gated by a [`GrowthGate`].
#[derive(Debug, Clone)]
pub struct GrowthEngine<G = ConditionValidator> {
    config: Arc<CropConfig>,
    gate: G,
}

impl<G: GrowthGate> GrowthEngine<G> {
    /// Create an engine for one species.
    pub fn new(config: Arc<CropConfig>, gate: G) -> Self {
        Self { config, gate }
    }

    /// The gate consulted before each update.
    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Duration of `stage` in seconds (0.0 outside the species' range).
    pub fn stage_duration(&self, stage: u32) -> f64 {
        self.config.stage_duration(stage).unwrap_or(0.0)
    }

    /// Advance `crop` by `delta_seconds` of wall time scaled by `bonuses`.
    ///
    /// Suspended crops neither gain nor lose progress. `delta_seconds` is
    /// trusted to be non-negative.
    pub fn update_growth(
        &self,
        world: &dyn WorldView,
        crop: &mut Crop,
        delta_seconds: f64,
        bonuses: Bonuses,
        now_millis: i64,
    ) -> Result<GrowthOutcome, GrowthError> {
        self.check_stage(crop)?;
        if self.config.is_terminal(crop.stage) {
            return Ok(GrowthOutcome::AtMaturity);
        }
        if let Err(failure) = self.gate.can_grow(world, &crop.position) {
            return Ok(GrowthOutcome::Suspended(failure));
        }
        self.apply_progress(crop, delta_seconds * bonuses.multiplier(), now_millis)
    }

    /// Apply already-scaled progress without consulting the gate.
    pub fn apply_progress(
        &self,
        crop: &mut Crop,
        progress: f64,
        now_millis: i64,
    ) -> Result<GrowthOutcome, GrowthError> {
        self.check_stage(crop)?;
        if self.config.is_terminal(crop.stage) {
            return Ok(GrowthOutcome::AtMaturity);
        }
        if !progress.is_finite() {
            return Err(GrowthError::NonFiniteProgress {
                id: crop.id.clone(),
                position: crop.position.clone(),
                progress,
            });
        }

        let from_stage = crop.stage;
        crop.stage_progress += progress;
        crop.total_age += progress;

        while !self.config.is_terminal(crop.stage) {
            let duration = self.stage_duration(crop.stage);
            if crop.stage_progress < duration {
                break;
            }
            crop.stage_progress -= duration;
            crop.stage += 1;
        }
        if self.config.is_terminal(crop.stage) {
            crop.stage_progress = crop.stage_progress.min(self.stage_duration(crop.stage));
        }

        crop.last_update_time = now_millis;
        if crop.stage != from_stage {
            crop.visual_height = self.config.visual_height(crop.stage);
            debug!(
                crop = %crop.id,
                position = %crop.position,
                from_stage,
                to_stage = crop.stage,
                "crop advanced"
            );
        }

        Ok(GrowthOutcome::Grew {
            from_stage,
            to_stage: crop.stage,
            progress,
        })
    }

    fn check_stage(&self, crop: &Crop) -> Result<(), GrowthError> {
        if (1..=self.config.stage_count).contains(&crop.stage) {
            Ok(())
        } else {
            Err(GrowthError::StageOutOfRange {
                id: crop.id.clone(),
                position: crop.position.clone(),
                stage: crop.stage,
                stage_count: self.config.stage_count,
            })
        }
    }
}
