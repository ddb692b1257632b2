//! Farm fixtures built on [`GridWorld`].

use cropcraft_world::{blocks, BlockPos, GridWorld, WorldPos};

/// Builder for a rectangular plot of soil with optional water, roof and biome.
///
/// Soil sits at `soil_y`; crops go one block above it. Water cells are placed
/// at crop level, matching how the bonus calculator searches.
#[derive(Debug, Clone)]
pub struct FarmPlot {
    world: String,
    origin: (i32, i32),
    soil_y: i32,
    width: i32,
    depth: i32,
    soil: String,
    water: Vec<(i32, i32)>,
    roof: Option<i32>,
    biome: Option<String>,
    skylight: Option<u8>,
}

impl FarmPlot {
    /// A 4x4 farmland plot at the origin of `world`, soil at y=63.
    pub fn new(world: &str) -> Self {
        Self {
            world: world.to_string(),
            origin: (0, 0),
            soil_y: 63,
            width: 4,
            depth: 4,
            soil: blocks::FARMLAND.to_string(),
            water: Vec::new(),
            roof: None,
            biome: None,
            skylight: None,
        }
    }

    /// Move the plot's minimum corner.
    pub fn at(mut self, x: i32, soil_y: i32, z: i32) -> Self {
        self.origin = (x, z);
        self.soil_y = soil_y;
        self
    }

    /// Plot extent in blocks.
    pub fn size(mut self, width: i32, depth: i32) -> Self {
        self.width = width.max(1);
        self.depth = depth.max(1);
        self
    }

    /// Soil block type.
    pub fn soil(mut self, block: &str) -> Self {
        self.soil = block.to_string();
        self
    }

    /// Put water at plot-relative `(dx, dz)` on crop level.
    pub fn water_at(mut self, dx: i32, dz: i32) -> Self {
        self.water.push((dx, dz));
        self
    }

    /// Cover the plot with stone `height` blocks above the soil.
    pub fn roofed(mut self, height: i32) -> Self {
        self.roof = Some(height.max(2));
        self
    }

    /// Biome for every column of the plot.
    pub fn biome(mut self, biome: &str) -> Self {
        self.biome = Some(biome.to_string());
        self
    }

    /// Sky light level for the whole world.
    pub fn skylight(mut self, level: u8) -> Self {
        self.skylight = Some(level);
        self
    }

    /// Materialise the plot.
    pub fn build(&self) -> GridWorld {
        let mut world = GridWorld::new();
        let (x0, z0) = self.origin;
        let (x1, z1) = (x0 + self.width - 1, z0 + self.depth - 1);
        world.fill(
            &self.world,
            BlockPos::new(x0, self.soil_y, z0),
            BlockPos::new(x1, self.soil_y, z1),
            &self.soil,
        );
        for &(dx, dz) in &self.water {
            world.set_block(
                WorldPos::new(self.world.as_str(), x0 + dx, self.soil_y + 1, z0 + dz),
                blocks::WATER,
            );
        }
        if let Some(height) = self.roof {
            let y = self.soil_y + height;
            world.fill(
                &self.world,
                BlockPos::new(x0, y, z0),
                BlockPos::new(x1, y, z1),
                blocks::STONE,
            );
        }
        if let Some(biome) = &self.biome {
            for x in x0..=x1 {
                for z in z0..=z1 {
                    world.set_biome(&self.world, x, z, biome);
                }
            }
        }
        if let Some(level) = self.skylight {
            world.set_skylight(level);
        }
        world
    }

    /// Every crop-level cell of the plot that is not water, in x then z order.
    pub fn crop_positions(&self) -> Vec<WorldPos> {
        let (x0, z0) = self.origin;
        let mut cells = Vec::new();
        for dx in 0..self.width {
            for dz in 0..self.depth {
                if !self.water.contains(&(dx, dz)) {
                    cells.push(WorldPos::new(self.world.as_str(), x0 + dx, self.soil_y + 1, z0 + dz));
                }
            }
        }
        cells
    }
}
