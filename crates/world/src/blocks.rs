//! Block type names understood by the crop engine.
//!
//! Block types are plain strings so any host registry can feed the engine;
//! these constants cover the vocabulary the built-in species refer to.

/// Empty space.
pub const AIR: &str = "air";
/// Empty space underground.
pub const CAVE_AIR: &str = "cave_air";
/// Still water.
pub const WATER: &str = "water";
/// Flowing water.
pub const FLOWING_WATER: &str = "flowing_water";
/// Short grass plant.
pub const GRASS: &str = "grass";
/// Tall grass plant.
pub const TALL_GRASS: &str = "tall_grass";
/// Fern plant.
pub const FERN: &str = "fern";
/// Tilled soil.
pub const FARMLAND: &str = "farmland";
/// Plain dirt.
pub const DIRT: &str = "dirt";
/// Grass-covered dirt.
pub const GRASS_BLOCK: &str = "grass_block";
/// Fungal soil.
pub const MYCELIUM: &str = "mycelium";
/// Stone.
pub const STONE: &str = "stone";
/// Sand.
pub const SAND: &str = "sand";
/// Glass (transparent to skylight).
pub const GLASS: &str = "glass";

/// Whether the block counts as water for irrigation.
pub fn is_water(block: &str) -> bool {
    matches!(block, WATER | FLOWING_WATER)
}

/// Whether a plant can share or grow into a cell holding this block.
pub fn is_non_obstructing(block: &str) -> bool {
    matches!(
        block,
        AIR | CAVE_AIR | WATER | FLOWING_WATER | GRASS | TALL_GRASS | FERN
    )
}

/// Whether skylight passes through this block.
pub fn transmits_skylight(block: &str) -> bool {
    matches!(block, AIR | CAVE_AIR | GLASS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_variants() {
        assert!(is_water(WATER));
        assert!(is_water(FLOWING_WATER));
        assert!(!is_water(FARMLAND));
    }

    #[test]
    fn plants_and_fluids_do_not_obstruct() {
        for block in [AIR, WATER, GRASS, TALL_GRASS] {
            assert!(is_non_obstructing(block), "{block} should not obstruct");
        }
        for block in [STONE, DIRT, GRASS_BLOCK, FARMLAND, GLASS] {
            assert!(!is_non_obstructing(block), "{block} should obstruct");
        }
    }
}
