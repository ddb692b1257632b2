use std::fmt;

use serde::{Deserialize, Serialize};

/// Chunk width and depth in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    /// Chunk X index.
    #[serde(rename = "chunkX")]
    pub x: i32,
    /// Chunk Z index.
    #[serde(rename = "chunkZ")]
    pub z: i32,
}

impl ChunkPos {
    /// Create a chunk coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the block column at world `x`/`z`.
    pub const fn containing(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE),
            z: z.div_euclid(CHUNK_SIZE),
        }
    }

    /// World-space block coordinates of this chunk's minimum corner.
    pub const fn origin(self) -> (i32, i32) {
        (self.x * CHUNK_SIZE, self.z * CHUNK_SIZE)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Integer block coordinate without a world name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (vertical).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing this block.
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos::containing(self.x, self.z)
    }
}

/// A block position qualified by the world (dimension) it lives in.
///
/// This is the canonical key for crops: two crops can never share one.
/// Ordering is world, then x, y, z.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldPos {
    /// World or dimension name (e.g. `"overworld"`).
    pub world: String,
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (vertical).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl WorldPos {
    /// Create a world position.
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Attach a world name to a bare block position.
    pub fn from_block(world: impl Into<String>, block: BlockPos) -> Self {
        Self::new(world, block.x, block.y, block.z)
    }

    /// The bare block coordinates.
    pub const fn block(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }

    /// Chunk containing this position.
    pub const fn chunk(&self) -> ChunkPos {
        ChunkPos::containing(self.x, self.z)
    }

    /// Same world, shifted by the given offsets. Coordinates clamp at the
    /// `i32` range.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            world: self.world.clone(),
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// The cell one unit above.
    pub fn up(&self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The cell one unit below.
    pub fn down(&self) -> Self {
        self.offset(0, -1, 0)
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{},{}", self.world, self.x, self.y, self.z)
    }
}
