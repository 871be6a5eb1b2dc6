//! Chunk coordinates and block storage for a single chunk.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::{blocks, BlockId, FluidState};

/// log2 of the chunk side length.
pub const CHUNK_DIM_EXPONENT: u32 = 4;
/// The dimensions of a chunk (cube).
pub const CHUNK_DIM: usize = 1 << CHUNK_DIM_EXPONENT;
/// The volume of a chunk in blocks.
pub const CHUNK_VOLUME: usize = CHUNK_DIM * CHUNK_DIM * CHUNK_DIM;

/// Position of a chunk relative to the world origin.
/// Measured in units of CHUNK_DIM = 16 blocks.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Determines the chunk containing the given world position,
    /// i.e. `floor(pos) >> CHUNK_DIM_EXPONENT` on each axis.
    pub fn from_pos(pos: Vec3) -> Self {
        let block = pos.floor().as_ivec3();
        Self::new(
            block.x >> CHUNK_DIM_EXPONENT,
            block.y >> CHUNK_DIM_EXPONENT,
            block.z >> CHUNK_DIM_EXPONENT,
        )
    }

    /// Returns the per-axis absolute coordinate differences.
    pub fn abs_delta(self, other: ChunkPos) -> IVec3 {
        (IVec3::from(other) - IVec3::from(self)).abs()
    }
}

impl From<IVec3> for ChunkPos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<ChunkPos> for IVec3 {
    fn from(pos: ChunkPos) -> Self {
        IVec3::new(pos.x, pos.y, pos.z)
    }
}

/// Stores the blocks and fluids of a 16x16x16 chunk.
///
/// Ordering: slices from Y=0 to Y=15, each containing slices
/// from Z=0 to Z=15, each of which contains blocks from X=0 to X=15.
#[derive(Debug, Clone)]
pub struct Chunk {
    blocks: Box<[BlockId]>,
    fluids: Box<[Option<FluidState>]>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunk {
    /// Creates a new chunk initialized with air and no fluids.
    pub fn new() -> Self {
        Self {
            blocks: vec![BlockId::new(blocks::Air); CHUNK_VOLUME].into_boxed_slice(),
            fluids: vec![None; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// Gets the block at the given position within this chunk.
    ///
    /// # Panics
    /// Panics if `x, y, or z >= CHUNK_DIM`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::ordinal(x, y, z)]
    }

    /// Sets the block at the given position within this chunk.
    ///
    /// # Panics
    /// Panics if `x, y, or z >= CHUNK_DIM`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        self.blocks[Self::ordinal(x, y, z)] = block;
    }

    pub fn fluid(&self, x: usize, y: usize, z: usize) -> Option<FluidState> {
        self.fluids[Self::ordinal(x, y, z)]
    }

    pub fn set_fluid(&mut self, x: usize, y: usize, z: usize, fluid: Option<FluidState>) {
        self.fluids[Self::ordinal(x, y, z)] = fluid;
    }

    /// Returns whether every block in this chunk is air and it holds no fluid.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.is::<blocks::Air>()) && self.fluids.iter().all(Option::is_none)
    }

    fn ordinal(x: usize, y: usize, z: usize) -> usize {
        assert!(x < CHUNK_DIM, "x coordinate {} out of bounds", x);
        assert!(y < CHUNK_DIM, "y coordinate {} out of bounds", y);
        assert!(z < CHUNK_DIM, "z coordinate {} out of bounds", z);
        (y * CHUNK_DIM * CHUNK_DIM) + (z * CHUNK_DIM) + x
    }
}
