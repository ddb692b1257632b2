//! Environmental growth bonuses.

use std::sync::Arc;

use cropcraft_world::{blocks, Weather, WorldPos, WorldView};
use serde::{Deserialize, Serialize};

use crate::config::CropConfig;

/// Independent water and rain factors; each is 1.0 when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bonuses {
    /// Water proximity factor.
    pub water: f64,
    /// Rain factor.
    pub rain: f64,
}

impl Bonuses {
    /// Neither bonus applies.
    pub const NONE: Self = Self {
        water: 1.0,
        rain: 1.0,
    };

    /// Effective growth multiplier. Bonuses add over the neutral baseline:
    /// 1.15 water and 1.10 rain give 1.25, not 1.265.
    pub fn multiplier(&self) -> f64 {
        self.water + self.rain - 1.0
    }
}

impl Default for Bonuses {
    fn default() -> Self {
        Self::NONE
    }
}

/// Detects water and rain around a crop.
#[derive(Debug, Clone)]
pub struct BonusCalculator {
    config: Arc<CropConfig>,
}

impl BonusCalculator {
    /// Create a calculator for one species.
    pub fn new(config: Arc<CropConfig>) -> Self {
        Self { config }
    }

    /// Water within Manhattan distance `radius` of `pos`, on the same y level.
    pub fn has_water_nearby(&self, world: &dyn WorldView, pos: &WorldPos, radius: i32) -> bool {
        for dx in -radius..=radius {
            let reach = radius - dx.abs();
            for dz in -reach..=reach {
                if blocks::is_water(world.block_type(&pos.offset(dx, 0, dz))) {
                    return true;
                }
            }
        }
        false
    }

    /// Rain reaches `pos`: it is raining and the cell sees the sky.
    pub fn is_raining(&self, world: &dyn WorldView, pos: &WorldPos, weather: &Weather) -> bool {
        weather.is_raining() && world.is_exposed_to_sky(pos)
    }

    /// Water and rain factors for the crop at `pos`.
    pub fn calculate_bonuses(&self, world: &dyn WorldView, pos: &WorldPos, weather: &Weather) -> Bonuses {
        let water = if self.has_water_nearby(world, pos, self.config.water_radius) {
            self.config.water_bonus
        } else {
            1.0
        };
        let rain = if self.is_raining(world, pos, weather) {
            self.config.rain_bonus
        } else {
            1.0
        };
        Bonuses { water, rain }
    }
}
