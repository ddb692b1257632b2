use crate::WorldPos;

/// Brightest light level a cell can report.
pub const MAX_LIGHT: u8 = 15;

/// Read-only queries the crop engine issues against the host world.
///
/// Implementations answer for any position, loaded or not; unknown cells
/// should read as air.
pub trait WorldView {
    /// Block type name at `pos` (e.g. `"farmland"`).
    fn block_type(&self, pos: &WorldPos) -> &str;

    /// Combined light level at `pos`, `0..=MAX_LIGHT`.
    fn light_level(&self, pos: &WorldPos) -> u8;

    /// Whether nothing above `pos` blocks the sky.
    fn is_exposed_to_sky(&self, pos: &WorldPos) -> bool;

    /// Biome name for the column containing `pos`.
    fn biome(&self, pos: &WorldPos) -> &str;
}
