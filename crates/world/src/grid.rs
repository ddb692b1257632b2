//! Sparse in-memory world used by the headless simulator and tests.

use std::collections::BTreeMap;

use crate::blocks::{self, AIR};
use crate::{BlockPos, WorldPos, WorldView, MAX_LIGHT};

/// Default biome reported for columns without an explicit biome.
pub const DEFAULT_BIOME: &str = "plains";

/// A sparse world: every cell is air unless set.
///
/// Light is `skylight` for sky-exposed cells and `ambient_light` otherwise,
/// unless a cell carries an explicit override.
#[derive(Debug, Clone)]
pub struct GridWorld {
    blocks: BTreeMap<WorldPos, String>,
    light_overrides: BTreeMap<WorldPos, u8>,
    biomes: BTreeMap<String, BTreeMap<(i32, i32), String>>,
    default_biome: String,
    skylight: u8,
    ambient_light: u8,
}

impl GridWorld {
    /// Create an empty world in full daylight.
    pub fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
            light_overrides: BTreeMap::new(),
            biomes: BTreeMap::new(),
            default_biome: DEFAULT_BIOME.to_string(),
            skylight: MAX_LIGHT,
            ambient_light: 0,
        }
    }

    /// Place a block. Setting air clears the cell.
    pub fn set_block(&mut self, pos: WorldPos, block: &str) {
        if block == AIR {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, block.to_string());
        }
    }

    /// Fill the inclusive box between `from` and `to` with one block type.
    pub fn fill(&mut self, world: &str, from: BlockPos, to: BlockPos, block: &str) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    self.set_block(WorldPos::new(world, x, y, z), block);
                }
            }
        }
    }

    /// Pin the light level of one cell, ignoring sky exposure.
    pub fn set_light(&mut self, pos: WorldPos, level: u8) {
        self.light_overrides.insert(pos, level.min(MAX_LIGHT));
    }

    /// Remove a pinned light level.
    pub fn clear_light(&mut self, pos: &WorldPos) {
        self.light_overrides.remove(pos);
    }

    /// Set the biome of a single column.
    pub fn set_biome(&mut self, world: &str, x: i32, z: i32, biome: &str) {
        self.biomes
            .entry(world.to_string())
            .or_default()
            .insert((x, z), biome.to_string());
    }

    /// Biome for columns without an explicit entry.
    pub fn set_default_biome(&mut self, biome: &str) {
        self.default_biome = biome.to_string();
    }

    /// Light level seen by sky-exposed cells.
    pub fn set_skylight(&mut self, level: u8) {
        self.skylight = level.min(MAX_LIGHT);
    }

    /// Current skylight level.
    pub fn skylight(&self) -> u8 {
        self.skylight
    }

    /// Light level seen by covered cells.
    pub fn set_ambient_light(&mut self, level: u8) {
        self.ambient_light = level.min(MAX_LIGHT);
    }

    /// Number of non-air cells.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldView for GridWorld {
    fn block_type(&self, pos: &WorldPos) -> &str {
        self.blocks.get(pos).map(String::as_str).unwrap_or(AIR)
    }

    fn light_level(&self, pos: &WorldPos) -> u8 {
        if let Some(level) = self.light_overrides.get(pos) {
            return *level;
        }
        if self.is_exposed_to_sky(pos) {
            self.skylight
        } else {
            self.ambient_light
        }
    }

    fn is_exposed_to_sky(&self, pos: &WorldPos) -> bool {
        // Keys sort by world, x, y, z: everything above `pos` in its x-slice
        // is one contiguous range.
        let start = WorldPos::new(pos.world.as_str(), pos.x, pos.y.saturating_add(1), i32::MIN);
        let end = WorldPos::new(pos.world.as_str(), pos.x, i32::MAX, i32::MAX);
        !self
            .blocks
            .range(start..=end)
            .any(|(above, block)| above.z == pos.z && !blocks::transmits_skylight(block))
    }

    fn biome(&self, pos: &WorldPos) -> &str {
        self.biomes
            .get(&pos.world)
            .and_then(|columns| columns.get(&(pos.x, pos.z)))
            .map(String::as_str)
            .unwrap_or(self.default_biome.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{FARMLAND, GLASS, STONE};

    fn at(x: i32, y: i32, z: i32) -> WorldPos {
        WorldPos::new("overworld", x, y, z)
    }

    #[test]
    fn unknown_cells_are_air() {
        let world = GridWorld::new();
        assert_eq!(world.block_type(&at(0, 64, 0)), AIR);
        assert_eq!(world.block_count(), 0);
    }

    #[test]
    fn setting_air_clears_cell() {
        let mut world = GridWorld::new();
        world.set_block(at(1, 1, 1), STONE);
        assert_eq!(world.block_count(), 1);
        world.set_block(at(1, 1, 1), AIR);
        assert_eq!(world.block_count(), 0);
    }

    #[test]
    fn fill_covers_inclusive_box() {
        let mut world = GridWorld::new();
        world.fill("overworld", BlockPos::new(2, 63, 2), BlockPos::new(0, 63, 0), FARMLAND);
        assert_eq!(world.block_count(), 9);
        assert_eq!(world.block_type(&at(1, 63, 2)), FARMLAND);
    }

    #[test]
    fn roof_blocks_sky_and_light() {
        let mut world = GridWorld::new();
        world.set_ambient_light(4);
        assert!(world.is_exposed_to_sky(&at(0, 64, 0)));
        assert_eq!(world.light_level(&at(0, 64, 0)), MAX_LIGHT);

        world.set_block(at(0, 80, 0), STONE);
        assert!(!world.is_exposed_to_sky(&at(0, 64, 0)));
        assert_eq!(world.light_level(&at(0, 64, 0)), 4);

        // Neighbouring columns and cells above the roof are unaffected.
        assert!(world.is_exposed_to_sky(&at(0, 64, 1)));
        assert!(world.is_exposed_to_sky(&at(0, 81, 0)));
    }

    #[test]
    fn glass_roof_keeps_sky() {
        let mut world = GridWorld::new();
        world.set_block(at(0, 70, 0), GLASS);
        assert!(world.is_exposed_to_sky(&at(0, 64, 0)));
    }

    #[test]
    fn other_worlds_do_not_cast_shadows() {
        let mut world = GridWorld::new();
        world.set_block(WorldPos::new("nether", 0, 80, 0), STONE);
        assert!(world.is_exposed_to_sky(&at(0, 64, 0)));
    }

    #[test]
    fn light_override_wins() {
        let mut world = GridWorld::new();
        world.set_light(at(0, 64, 0), 3);
        assert_eq!(world.light_level(&at(0, 64, 0)), 3);
        world.clear_light(&at(0, 64, 0));
        assert_eq!(world.light_level(&at(0, 64, 0)), MAX_LIGHT);
    }

    #[test]
    fn biomes_fall_back_to_default() {
        let mut world = GridWorld::new();
        world.set_biome("overworld", 5, 5, "desert");
        assert_eq!(world.biome(&at(5, 64, 5)), "desert");
        assert_eq!(world.biome(&at(5, 64, 6)), DEFAULT_BIOME);
        world.set_default_biome("forest");
        assert_eq!(world.biome(&at(9, 64, 9)), "forest");
    }
}
