//! The crop entity.

use std::fmt;

use cropcraft_world::{ChunkPos, WorldPos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CropConfig;
use crate::persist::{CropRecord, PositionRecord};

/// Opaque identifier, unique per planted instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropId(String);

impl CropId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One planted crop.
///
/// Only the growth engine (progress, stage, age, height) and restore from a
/// save record mutate a crop; everything else reads it through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Crop {
    pub(crate) id: CropId,
    pub(crate) position: WorldPos,
    pub(crate) stage: u32,
    pub(crate) stage_progress: f64,
    pub(crate) total_age: f64,
    pub(crate) planted_at: i64,
    pub(crate) last_update_time: i64,
    pub(crate) visual_height: f32,
    /// Seconds since the last particle burst; never persisted.
    pub(crate) particle_timer: f64,
}

/// Why a save record could not become a crop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropRestoreError {
    /// Stage outside the species' range.
    #[error("crop {id} has stage {stage}, outside 1..={stage_count}")]
    StageOutOfRange {
        /// Offending crop.
        id: CropId,
        /// Stored stage.
        stage: u32,
        /// Species stage count.
        stage_count: u32,
    },
    /// Negative or non-finite progress/age.
    #[error("crop {id} has invalid {field}: {value}")]
    InvalidDuration {
        /// Offending crop.
        id: CropId,
        /// `"stageProgress"` or `"totalAge"`.
        field: &'static str,
        /// Stored value.
        value: f64,
    },
    /// Stored chunk coordinates disagree with the block position.
    #[error("crop {id} claims chunk {stored} but sits in chunk {actual}")]
    ChunkMismatch {
        /// Offending crop.
        id: CropId,
        /// Chunk written in the record.
        stored: ChunkPos,
        /// Chunk derived from x/z.
        actual: ChunkPos,
    },
}

impl Crop {
    /// A freshly planted crop: stage 1, no progress.
    pub fn planted(id: CropId, position: WorldPos, now_millis: i64, config: &CropConfig) -> Self {
        Self {
            id,
            position,
            stage: 1,
            stage_progress: 0.0,
            total_age: 0.0,
            planted_at: now_millis,
            last_update_time: now_millis,
            visual_height: config.visual_height(1),
            particle_timer: 0.0,
        }
    }

    /// Rebuild a crop from its save record, recomputing derived fields.
    pub fn from_record(record: CropRecord, config: &CropConfig) -> Result<Self, CropRestoreError> {
        let id = CropId::new(record.id);
        if !(1..=config.stage_count).contains(&record.stage) {
            return Err(CropRestoreError::StageOutOfRange {
                id,
                stage: record.stage,
                stage_count: config.stage_count,
            });
        }
        for (field, value) in [
            ("stageProgress", record.stage_progress),
            ("totalAge", record.total_age),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CropRestoreError::InvalidDuration { id, field, value });
            }
        }

        let position = record.position.world_pos();
        let stored = record.position.chunk();
        if stored != position.chunk() {
            return Err(CropRestoreError::ChunkMismatch {
                id,
                stored,
                actual: position.chunk(),
            });
        }

        Ok(Self {
            id,
            position,
            stage: record.stage,
            stage_progress: record.stage_progress,
            total_age: record.total_age,
            planted_at: record.planted_at,
            last_update_time: record.last_update_time,
            visual_height: config.visual_height(record.stage),
            particle_timer: 0.0,
        })
    }

    /// The persisted subset of this crop.
    pub fn to_record(&self) -> CropRecord {
        CropRecord {
            id: self.id.as_str().to_string(),
            position: PositionRecord::from(&self.position),
            stage: self.stage,
            stage_progress: self.stage_progress,
            total_age: self.total_age,
            planted_at: self.planted_at,
            last_update_time: self.last_update_time,
        }
    }

    /// Instance identifier.
    pub fn id(&self) -> &CropId {
        &self.id
    }

    /// Where the crop stands.
    pub fn position(&self) -> &WorldPos {
        &self.position
    }

    /// Chunk the crop belongs to.
    pub fn chunk(&self) -> ChunkPos {
        self.position.chunk()
    }

    /// Current stage, `1..=stage_count`.
    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// Seconds accumulated in the current stage.
    pub fn stage_progress(&self) -> f64 {
        self.stage_progress
    }

    /// Seconds accumulated since planting.
    pub fn total_age(&self) -> f64 {
        self.total_age
    }

    /// Planting time, epoch milliseconds.
    pub fn planted_at(&self) -> i64 {
        self.planted_at
    }

    /// Last growth update, epoch milliseconds.
    pub fn last_update_time(&self) -> i64 {
        self.last_update_time
    }

    /// Model height derived from the stage.
    pub fn visual_height(&self) -> f32 {
        self.visual_height
    }

    /// Whether harvesting now would yield produce.
    pub fn is_mature(&self, config: &CropConfig) -> bool {
        config.is_mature(self.stage)
    }
}
