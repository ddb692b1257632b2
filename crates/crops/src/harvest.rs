//! Harvest yields.
//!
//! Immature crops give back a fixed handful of seeds. Mature crops roll each
//! item class on its own two-point distribution, except that an enchantment
//! level with a fortune entry swaps the produce roll for a uniform draw over
//! a widened range.

use std::sync::Arc;

use cropcraft_core::{HarvestItem, ItemStack};
use cropcraft_world::WorldPos;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{CropConfig, ItemYield};
use crate::crop::CropId;

/// Item counts produced by one harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HarvestYield {
    /// Produce count.
    pub primary: u32,
    /// Seed count.
    pub seeds: u32,
}

/// Everything the host needs to hand out a harvest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestRecord {
    /// Crop that was harvested.
    pub crop_id: CropId,
    /// Where it stood.
    pub position: WorldPos,
    /// Stage at harvest time.
    pub stage: u32,
    /// Whether the stage counted as mature.
    pub mature: bool,
    /// Enchantment level the caller passed.
    pub enchantment_level: i32,
    /// Raw counts.
    pub yields: HarvestYield,
    /// Non-empty item stacks to drop.
    pub items: Vec<ItemStack>,
    /// Seconds of growth the crop had accumulated.
    pub total_age: f64,
    /// Harvest time, epoch milliseconds.
    pub harvested_at: i64,
}

/// Maps (stage, enchantment level) to a harvest.
#[derive(Debug, Clone)]
pub struct YieldCalculator {
    config: Arc<CropConfig>,
}

impl YieldCalculator {
    /// Create a calculator for one species.
    pub fn new(config: Arc<CropConfig>) -> Self {
        Self { config }
    }

    /// Fortune table index for `level`; levels without an entry count as 0.
    pub fn effective_level(&self, level: i32) -> usize {
        match usize::try_from(level) {
            Ok(level) if level < self.config.yields.fortune_bonus.len() => level,
            _ => 0,
        }
    }

    /// Inclusive produce range for a mature crop at `level`. Level 0 returns
    /// the two-point bounds.
    pub fn primary_range(&self, level: i32) -> (u32, u32) {
        let yields = &self.config.yields;
        match self.effective_level(level) {
            0 => (yields.primary.min, yields.primary.max),
            level => (
                yields.fortune_min_primary,
                yields.primary.max + yields.fortune_bonus[level],
            ),
        }
    }

    /// Roll a harvest for a crop at `stage`.
    pub fn calculate<R: Rng + ?Sized>(&self, stage: u32, level: i32, rng: &mut R) -> HarvestYield {
        let yields = &self.config.yields;
        if !self.config.is_mature(stage) {
            return HarvestYield {
                primary: 0,
                seeds: yields.immature_seeds,
            };
        }

        let primary = match self.effective_level(level) {
            0 => two_point(&yields.primary, rng),
            _ => {
                let (low, high) = self.primary_range(level);
                rng.gen_range(low..=high)
            }
        };
        let seeds = two_point(&yields.seed, rng);
        HarvestYield { primary, seeds }
    }

    /// Turn counts into named, non-empty stacks.
    pub fn to_stacks(&self, harvest: HarvestYield) -> Vec<ItemStack> {
        let yields = &self.config.yields;
        [
            ItemStack::new(HarvestItem::Primary, &yields.primary.item, harvest.primary),
            ItemStack::new(HarvestItem::Seed, &yields.seed.item, harvest.seeds),
        ]
        .into_iter()
        .filter(|stack| !stack.is_empty())
        .collect()
    }
}

fn two_point<R: Rng + ?Sized>(table: &ItemYield, rng: &mut R) -> u32 {
    if rng.gen::<f64>() < table.high_chance {
        table.max
    } else {
        table.min
    }
}
