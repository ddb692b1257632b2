//! Soil, space and light rules.
//!
//! Planting and growing check different cells on purpose: a seed needs room in
//! the cell it is planted into, while a growing crop already occupies its cell
//! and needs room above it.

use std::sync::Arc;

use cropcraft_world::{blocks, WorldPos, WorldView};
use thiserror::Error;

use crate::config::CropConfig;

/// A failed condition check, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionFailure {
    /// Block below is not a valid soil for the species.
    #[error("`{found}` is not a valid soil for {species}")]
    InvalidSoil {
        /// Block type found below the crop.
        found: String,
        /// Species being checked.
        species: String,
    },
    /// Not enough light at the crop's cell.
    #[error("light level {level} is below the required {required}")]
    InsufficientLight {
        /// Light at the cell.
        level: u8,
        /// Species minimum.
        required: u8,
    },
    /// The cell the crop grows into is blocked.
    #[error("growth is obstructed by `{block}` above")]
    Obstructed {
        /// Block type in the way.
        block: String,
    },
}

/// Decides whether a crop may grow this tick.
///
/// The growth engine only depends on this contract, so hosts can swap in a
/// different rule set (greenhouses, creative mode) without touching it.
pub trait GrowthGate {
    /// `Ok(())` when the crop at `pos` may grow right now.
    fn can_grow(&self, world: &dyn WorldView, pos: &WorldPos) -> Result<(), ConditionFailure>;
}

/// Species-aware condition checks against the host world.
#[derive(Debug, Clone)]
pub struct ConditionValidator {
    config: Arc<CropConfig>,
}

impl ConditionValidator {
    /// Create a validator for one species.
    pub fn new(config: Arc<CropConfig>) -> Self {
        Self { config }
    }

    /// True iff the block directly below `pos` is one of the species' soils.
    pub fn is_valid_soil(&self, world: &dyn WorldView, pos: &WorldPos) -> bool {
        self.config
            .valid_soils
            .contains(world.block_type(&pos.down()))
    }

    /// True iff the checked cell (`pos`, or the one above it when
    /// `check_above` is set) holds a non-obstructing block.
    pub fn has_space_above(&self, world: &dyn WorldView, pos: &WorldPos, check_above: bool) -> bool {
        let cell = if check_above { pos.up() } else { pos.clone() };
        blocks::is_non_obstructing(world.block_type(&cell))
    }

    /// Soil check for planting. Space at `pos` is the caller's concern.
    pub fn can_plant(&self, world: &dyn WorldView, pos: &WorldPos) -> Result<(), ConditionFailure> {
        if self.is_valid_soil(world, pos) {
            Ok(())
        } else {
            Err(ConditionFailure::InvalidSoil {
                found: world.block_type(&pos.down()).to_string(),
                species: self.config.species.clone(),
            })
        }
    }

    /// Light at `pos` meets the species minimum and the cell above is free.
    pub fn can_grow(&self, world: &dyn WorldView, pos: &WorldPos) -> Result<(), ConditionFailure> {
        let level = self.light_level(world, pos);
        if level < self.config.min_light {
            return Err(ConditionFailure::InsufficientLight {
                level,
                required: self.config.min_light,
            });
        }
        if !self.has_space_above(world, pos, true) {
            return Err(ConditionFailure::Obstructed {
                block: world.block_type(&pos.up()).to_string(),
            });
        }
        Ok(())
    }

    /// Light level at `pos`.
    pub fn light_level(&self, world: &dyn WorldView, pos: &WorldPos) -> u8 {
        world.light_level(pos)
    }

    /// Whether `pos` sees the sky.
    pub fn is_exposed_to_sky(&self, world: &dyn WorldView, pos: &WorldPos) -> bool {
        world.is_exposed_to_sky(pos)
    }
}

impl GrowthGate for ConditionValidator {
    fn can_grow(&self, world: &dyn WorldView, pos: &WorldPos) -> Result<(), ConditionFailure> {
        ConditionValidator::can_grow(self, world, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropcraft_world::blocks::{DIRT, FARMLAND, GRASS, STONE, WATER};
    use cropcraft_world::GridWorld;

    fn crop_pos() -> WorldPos {
        WorldPos::new("overworld", 0, 64, 0)
    }

    fn farm() -> GridWorld {
        let mut world = GridWorld::new();
        world.set_block(crop_pos().down(), FARMLAND);
        world
    }

    fn validator() -> ConditionValidator {
        ConditionValidator::new(Arc::new(CropConfig::oats()))
    }

    #[test]
    fn soil_must_match_exactly() {
        let mut world = farm();
        assert!(validator().is_valid_soil(&world, &crop_pos()));
        world.set_block(crop_pos().down(), DIRT);
        assert!(!validator().is_valid_soil(&world, &crop_pos()));
        world.set_block(crop_pos().down(), "farmland_wet");
        assert!(!validator().is_valid_soil(&world, &crop_pos()));
    }

    #[test]
    fn can_plant_explains_bad_soil() {
        let mut world = farm();
        assert_eq!(validator().can_plant(&world, &crop_pos()), Ok(()));
        world.set_block(crop_pos().down(), DIRT);
        let failure = validator().can_plant(&world, &crop_pos()).unwrap_err();
        assert!(failure.to_string().contains("dirt"));
    }

    #[test]
    fn can_plant_ignores_space() {
        let mut world = farm();
        world.set_block(crop_pos(), STONE);
        assert_eq!(validator().can_plant(&world, &crop_pos()), Ok(()));
    }

    #[test]
    fn space_check_selects_cell() {
        let mut world = farm();
        world.set_block(crop_pos().up(), STONE);
        assert!(validator().has_space_above(&world, &crop_pos(), false));
        assert!(!validator().has_space_above(&world, &crop_pos(), true));

        world.set_block(crop_pos().up(), GRASS);
        assert!(validator().has_space_above(&world, &crop_pos(), true));
        world.set_block(crop_pos().up(), WATER);
        assert!(validator().has_space_above(&world, &crop_pos(), true));
    }

    #[test]
    fn growth_needs_light() {
        let mut world = farm();
        world.set_light(crop_pos(), 8);
        let failure = validator().can_grow(&world, &crop_pos()).unwrap_err();
        assert_eq!(
            failure,
            ConditionFailure::InsufficientLight {
                level: 8,
                required: 9
            }
        );
        assert!(failure.to_string().contains("light"));

        world.set_light(crop_pos(), 9);
        assert_eq!(validator().can_grow(&world, &crop_pos()), Ok(()));
    }

    #[test]
    fn growth_needs_free_cell_above() {
        let mut world = farm();
        world.set_block(crop_pos().up(), STONE);
        world.set_light(crop_pos(), 15);
        let failure = validator().can_grow(&world, &crop_pos()).unwrap_err();
        assert!(failure.to_string().contains("obstructed"));
    }

    #[test]
    fn shade_species_grows_in_darkness() {
        let mut world = GridWorld::new();
        world.set_block(crop_pos().down(), cropcraft_world::blocks::MYCELIUM);
        world.set_light(crop_pos(), 0);
        let validator = ConditionValidator::new(Arc::new(CropConfig::glowcap()));
        assert_eq!(validator.can_plant(&world, &crop_pos()), Ok(()));
        assert_eq!(validator.can_grow(&world, &crop_pos()), Ok(()));
    }

    #[test]
    fn pass_through_queries() {
        let mut world = farm();
        world.set_light(crop_pos(), 11);
        assert_eq!(validator().light_level(&world, &crop_pos()), 11);
        assert!(validator().is_exposed_to_sky(&world, &crop_pos()));
    }
}
