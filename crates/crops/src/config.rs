//! Per-species crop configuration.
//!
//! One engine drives every species; a species is nothing more than a
//! [`CropConfig`] value. Configs are plain serde data so they can be authored
//! in TOML, and [`CropConfig::validate`] guards the invariants the engine
//! relies on (stage shares summing to one, multipliers never below neutral,
//! probabilities in range).

use std::collections::BTreeSet;

use cropcraft_world::blocks;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance when checking that stage shares sum to 1.0.
const DISTRIBUTION_EPSILON: f64 = 1e-6;

/// Immutable description of one crop species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Species identifier, used in crop ids and storage keys.
    pub species: String,
    /// Seconds from planting to maturity with no bonuses.
    pub base_growth_time: f64,
    /// Share of `base_growth_time` spent in each stage; sums to 1.0.
    pub stage_distribution: Vec<f64>,
    /// Number of growth stages; the last one is terminal.
    pub stage_count: u32,
    /// Growth multiplier when water is within `water_radius` (e.g. 1.15).
    pub water_bonus: f64,
    /// Growth multiplier when rain reaches the crop (e.g. 1.10).
    pub rain_bonus: f64,
    /// Manhattan radius searched for water, on the crop's own y level.
    pub water_radius: i32,
    /// Minimum light level at the crop's cell for growth.
    pub min_light: u8,
    /// Block types the crop can be planted on.
    pub valid_soils: BTreeSet<String>,
    /// Biomes where planting is refused.
    pub incompatible_biomes: BTreeSet<String>,
    /// Harvest tables.
    pub yields: YieldConfig,
    /// Visual descriptor per stage, index 0 = stage 1.
    pub visuals: Vec<StageVisual>,
    /// Seconds between particle bursts on mature crops.
    pub particle_interval: f64,
}

/// Two-point yield for one item class: `max` with `high_chance`, else `min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemYield {
    /// Item name dropped.
    pub item: String,
    /// Count on the low branch.
    pub min: u32,
    /// Count on the high branch; also the base ceiling for fortune rolls.
    pub max: u32,
    /// Probability of the high branch.
    pub high_chance: f64,
}

/// Harvest tables for a species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldConfig {
    /// The crop's produce.
    pub primary: ItemYield,
    /// Replantable seeds.
    pub seed: ItemYield,
    /// First stage that yields produce.
    pub mature_stage: u32,
    /// Seeds returned when harvesting before `mature_stage`.
    pub immature_seeds: u32,
    /// Lower bound of the uniform fortune roll for produce.
    pub fortune_min_primary: u32,
    /// Extra produce ceiling per enchantment level; index 0 is level 0.
    pub fortune_bonus: Vec<u32>,
}

/// How a stage's model is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Straight up.
    #[default]
    Upright,
    /// Two crossed quads.
    Crossed,
    /// Heads bending under their weight.
    Drooping,
}

/// Vertical color blend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient {
    /// Color at the tip.
    pub top: String,
    /// Color at the base.
    pub bottom: String,
}

/// Rendering hints for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageVisual {
    /// Base color as `#RRGGBB`.
    pub color: String,
    /// Model height in blocks.
    pub height: f32,
    /// Model orientation.
    #[serde(default)]
    pub orientation: Orientation,
    /// Optional color blend.
    #[serde(default)]
    pub gradient: Option<Gradient>,
}

/// A config that would break engine invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Species name is empty.
    #[error("species name must not be empty")]
    EmptySpecies,
    /// No stages at all.
    #[error("stage count must be at least 1")]
    NoStages,
    /// Base growth time is zero, negative or not finite.
    #[error("base growth time must be positive, got {0}")]
    InvalidGrowthTime(f64),
    /// Distribution length disagrees with the stage count.
    #[error("stage distribution has {found} entries, expected {expected}")]
    DistributionLength {
        /// Entries present.
        found: usize,
        /// Stage count.
        expected: u32,
    },
    /// A stage share is zero, negative or not finite.
    #[error("stage {stage} share must be positive, got {share}")]
    InvalidShare {
        /// 1-based stage.
        stage: u32,
        /// Offending share.
        share: f64,
    },
    /// Shares do not add up to one.
    #[error("stage distribution sums to {0}, expected 1.0")]
    DistributionSum(f64),
    /// A multiplier would slow growth down.
    #[error("{name} bonus must be >= 1.0, got {value}")]
    InvalidBonus {
        /// `"water"` or `"rain"`.
        name: &'static str,
        /// Offending multiplier.
        value: f64,
    },
    /// A probability outside `[0, 1]`.
    #[error("{item} high chance must be within [0, 1], got {value}")]
    InvalidChance {
        /// Item the table belongs to.
        item: String,
        /// Offending probability.
        value: f64,
    },
    /// `min > max` in an item table.
    #[error("{item} yield range {min}..={max} is empty")]
    InvalidRange {
        /// Item the table belongs to.
        item: String,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },
    /// Mature stage outside `1..=stage_count`.
    #[error("mature stage {stage} is outside 1..={stage_count}")]
    InvalidMatureStage {
        /// Configured mature stage.
        stage: u32,
        /// Stage count.
        stage_count: u32,
    },
    /// Fortune floor above the base ceiling.
    #[error("fortune minimum {min} exceeds the primary maximum {max}")]
    InvalidFortuneFloor {
        /// Fortune floor.
        min: u32,
        /// Primary base ceiling.
        max: u32,
    },
    /// Fortune table is empty (it needs at least the level-0 entry).
    #[error("fortune bonus table must contain the level-0 entry")]
    EmptyFortuneTable,
    /// Visual list length disagrees with the stage count.
    #[error("{found} stage visuals configured, expected {expected}")]
    VisualCount {
        /// Visuals present.
        found: usize,
        /// Stage count.
        expected: u32,
    },
}

impl CropConfig {
    /// Oats: four equal stages over four days on farmland.
    pub fn oats() -> Self {
        Self {
            species: "oats".to_string(),
            base_growth_time: 4.0 * 86_400.0,
            stage_distribution: vec![0.25; 4],
            stage_count: 4,
            water_bonus: 1.15,
            rain_bonus: 1.10,
            water_radius: 4,
            min_light: 9,
            valid_soils: [blocks::FARMLAND].iter().map(|s| s.to_string()).collect(),
            incompatible_biomes: ["desert", "badlands", "ocean", "deep_ocean", "snowy_plains"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            yields: YieldConfig {
                primary: ItemYield {
                    item: "oats".to_string(),
                    min: 1,
                    max: 2,
                    high_chance: 0.8,
                },
                seed: ItemYield {
                    item: "oat_seeds".to_string(),
                    min: 1,
                    max: 2,
                    high_chance: 0.5,
                },
                mature_stage: 4,
                immature_seeds: 1,
                fortune_min_primary: 1,
                fortune_bonus: vec![0, 1, 2, 3],
            },
            visuals: vec![
                StageVisual {
                    color: "#6B8E23".to_string(),
                    height: 0.25,
                    orientation: Orientation::Upright,
                    gradient: None,
                },
                StageVisual {
                    color: "#7CB342".to_string(),
                    height: 0.5,
                    orientation: Orientation::Upright,
                    gradient: None,
                },
                StageVisual {
                    color: "#9ACD32".to_string(),
                    height: 0.75,
                    orientation: Orientation::Crossed,
                    gradient: Some(Gradient {
                        top: "#C5D86D".to_string(),
                        bottom: "#6B8E23".to_string(),
                    }),
                },
                StageVisual {
                    color: "#DAA520".to_string(),
                    height: 1.0,
                    orientation: Orientation::Drooping,
                    gradient: Some(Gradient {
                        top: "#F0E68C".to_string(),
                        bottom: "#9ACD32".to_string(),
                    }),
                },
            ],
            particle_interval: 2.0,
        }
    }

    /// Glowcap: a shade-loving fungus that grows in the dark on mycelium and
    /// gets nothing from rain.
    pub fn glowcap() -> Self {
        Self {
            species: "glowcap".to_string(),
            base_growth_time: 2.0 * 86_400.0,
            stage_distribution: vec![0.2, 0.3, 0.5],
            stage_count: 3,
            water_bonus: 1.2,
            rain_bonus: 1.0,
            water_radius: 2,
            min_light: 0,
            valid_soils: [blocks::MYCELIUM].iter().map(|s| s.to_string()).collect(),
            incompatible_biomes: ["desert", "ocean", "deep_ocean"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            yields: YieldConfig {
                primary: ItemYield {
                    item: "glowcap".to_string(),
                    min: 1,
                    max: 3,
                    high_chance: 0.6,
                },
                seed: ItemYield {
                    item: "glowcap_spores".to_string(),
                    min: 0,
                    max: 1,
                    high_chance: 0.3,
                },
                mature_stage: 3,
                immature_seeds: 1,
                fortune_min_primary: 1,
                fortune_bonus: vec![0, 1, 1, 2],
            },
            visuals: vec![
                StageVisual {
                    color: "#4B0082".to_string(),
                    height: 0.2,
                    orientation: Orientation::Upright,
                    gradient: None,
                },
                StageVisual {
                    color: "#6A5ACD".to_string(),
                    height: 0.45,
                    orientation: Orientation::Upright,
                    gradient: None,
                },
                StageVisual {
                    color: "#7FFFD4".to_string(),
                    height: 0.6,
                    orientation: Orientation::Upright,
                    gradient: Some(Gradient {
                        top: "#E0FFFF".to_string(),
                        bottom: "#6A5ACD".to_string(),
                    }),
                },
            ],
            particle_interval: 1.0,
        }
    }

    /// Look up a built-in species by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "oats" => Some(Self::oats()),
            "glowcap" => Some(Self::glowcap()),
            _ => None,
        }
    }

    /// Names accepted by [`CropConfig::preset`].
    pub fn preset_names() -> &'static [&'static str] {
        &["oats", "glowcap"]
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.species.trim().is_empty() {
            return Err(ConfigError::EmptySpecies);
        }
        if self.stage_count == 0 {
            return Err(ConfigError::NoStages);
        }
        if !(self.base_growth_time.is_finite() && self.base_growth_time > 0.0) {
            return Err(ConfigError::InvalidGrowthTime(self.base_growth_time));
        }
        if self.stage_distribution.len() != self.stage_count as usize {
            return Err(ConfigError::DistributionLength {
                found: self.stage_distribution.len(),
                expected: self.stage_count,
            });
        }
        for (index, share) in self.stage_distribution.iter().enumerate() {
            if !(share.is_finite() && *share > 0.0) {
                return Err(ConfigError::InvalidShare {
                    stage: index as u32 + 1,
                    share: *share,
                });
            }
        }
        let sum: f64 = self.stage_distribution.iter().sum();
        if (sum - 1.0).abs() > DISTRIBUTION_EPSILON {
            return Err(ConfigError::DistributionSum(sum));
        }
        for (name, value) in [("water", self.water_bonus), ("rain", self.rain_bonus)] {
            if !(value.is_finite() && value >= 1.0) {
                return Err(ConfigError::InvalidBonus { name, value });
            }
        }
        for table in [&self.yields.primary, &self.yields.seed] {
            if !(0.0..=1.0).contains(&table.high_chance) {
                return Err(ConfigError::InvalidChance {
                    item: table.item.clone(),
                    value: table.high_chance,
                });
            }
            if table.min > table.max {
                return Err(ConfigError::InvalidRange {
                    item: table.item.clone(),
                    min: table.min,
                    max: table.max,
                });
            }
        }
        if !(1..=self.stage_count).contains(&self.yields.mature_stage) {
            return Err(ConfigError::InvalidMatureStage {
                stage: self.yields.mature_stage,
                stage_count: self.stage_count,
            });
        }
        if self.yields.fortune_min_primary > self.yields.primary.max {
            return Err(ConfigError::InvalidFortuneFloor {
                min: self.yields.fortune_min_primary,
                max: self.yields.primary.max,
            });
        }
        if self.yields.fortune_bonus.is_empty() {
            return Err(ConfigError::EmptyFortuneTable);
        }
        if self.visuals.len() != self.stage_count as usize {
            return Err(ConfigError::VisualCount {
                found: self.visuals.len(),
                expected: self.stage_count,
            });
        }
        Ok(())
    }

    /// Seconds spent in `stage` (1-based), or `None` outside `1..=stage_count`.
    pub fn stage_duration(&self, stage: u32) -> Option<f64> {
        let index = stage.checked_sub(1)? as usize;
        self.stage_distribution
            .get(index)
            .map(|share| self.base_growth_time * share)
    }

    /// Whether `stage` is the terminal stage (or beyond).
    pub fn is_terminal(&self, stage: u32) -> bool {
        stage >= self.stage_count
    }

    /// Whether a crop at `stage` yields produce.
    pub fn is_mature(&self, stage: u32) -> bool {
        stage >= self.yields.mature_stage
    }

    /// Visual descriptor for `stage` (1-based).
    pub fn visual(&self, stage: u32) -> Option<&StageVisual> {
        let index = stage.checked_sub(1)? as usize;
        self.visuals.get(index)
    }

    /// Model height for `stage`; 0.0 when no visual is configured.
    pub fn visual_height(&self, stage: u32) -> f32 {
        self.visual(stage).map_or(0.0, |visual| visual.height)
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self::oats()
    }
}
