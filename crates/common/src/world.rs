//! The world collaborator interface and an in-memory world.

use ahash::AHashMap;
use glam::Vec3;

use crate::{
    blocks, chunk::CHUNK_DIM_EXPONENT, geom::Axis, Aabb, BlockId, Chunk, ChunkPos, FluidState,
};

/// Position of a block. Measured in blocks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block containing the given world position.
    pub fn from_pos(pos: Vec3) -> Self {
        let pos = pos.floor().as_ivec3();
        Self::new(pos.x, pos.y, pos.z)
    }

    /// The minimum corner of this block in world space.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Determines the chunk containing this block.
    pub fn chunk(self) -> ChunkPos {
        ChunkPos::new(
            self.x >> CHUNK_DIM_EXPONENT,
            self.y >> CHUNK_DIM_EXPONENT,
            self.z >> CHUNK_DIM_EXPONENT,
        )
    }

    /// Determines the position of this BlockPos relative to its chunk.
    pub fn chunk_local(self) -> (usize, usize, usize) {
        let mask = (1 << CHUNK_DIM_EXPONENT) - 1;
        (
            (self.x & mask) as usize,
            (self.y & mask) as usize,
            (self.z & mask) as usize,
        )
    }

    pub fn offset(self, x: i32, y: i32, z: i32) -> Self {
        Self::new(self.x + x, self.y + y, self.z + z)
    }
}

/// Receives streaming hints for chunks around entities.
///
/// Both calls are fire-and-forget. Implementations reference-count
/// requests, so a chunk requested twice must be released twice.
pub trait ChunkStreamer {
    fn request_chunk(&mut self, pos: ChunkPos);

    fn release_chunk(&mut self, pos: ChunkPos);
}

/// The result of testing a collider volume against the terrain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainIntersection {
    /// Whether a solid block was hit along each axis, indexed by [`Axis::index`].
    pub hits: [bool; 3],
    /// Every non-air block overlapping the volume.
    pub blocks: Vec<(BlockPos, BlockId)>,
    /// Every fluid volume overlapping the volume.
    pub fluids: Vec<(BlockPos, FluidState)>,
}

impl TerrainIntersection {
    pub fn hit(&self, axis: Axis) -> bool {
        self.hits[axis.index()]
    }

    pub fn any_hit(&self) -> bool {
        self.hits.iter().any(|&hit| hit)
    }
}

/// The world as seen by entities.
///
/// Missing data (unloaded chunks, positions outside the world)
/// reads as air with no fluid.
pub trait World: ChunkStreamer {
    /// Gets the block at `pos`, or `None` if its chunk is not known.
    fn block(&self, pos: BlockPos) -> Option<BlockId>;

    fn fluid(&self, pos: BlockPos) -> Option<FluidState>;

    /// Half-size of the traversable region, centered on the origin.
    fn extents(&self) -> Vec3;

    fn spawn_position(&self) -> Vec3;

    fn is_solid(&self, pos: BlockPos) -> bool {
        self.block(pos).map_or(false, BlockId::is_solid)
    }

    /// Tests `collider`, which has just moved there from `before`, against
    /// the terrain.
    ///
    /// An axis is reported as hit when a solid block now overlapping the
    /// collider was clear of `before` on that axis. Blocks `before` already
    /// overlapped do not report hits, so a body stuck inside terrain can
    /// move out of it.
    fn intersect_terrain(&self, before: Aabb, collider: Aabb) -> TerrainIntersection {
        let mut result = TerrainIntersection::default();

        let min = BlockPos::from_pos(collider.min);
        let max = BlockPos::from_pos(collider.max);

        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let pos = BlockPos::new(x, y, z);

                    let block = self.block(pos).filter(|block| !block.is::<blocks::Air>());
                    if let Some(block) = block {
                        let cell = Aabb::unit(pos.to_vec3());
                        if collider.intersects(cell) {
                            if block.is_solid() {
                                for axis in Axis::ALL.iter().copied() {
                                    if before.separated_on(cell, axis) {
                                        result.hits[axis.index()] = true;
                                    }
                                }
                            }
                            result.blocks.push((pos, block));
                        }
                    }

                    if let Some(fluid) = self.fluid(pos) {
                        if collider.intersects(fluid.bounds(pos)) {
                            result.fluids.push((pos, fluid));
                        }
                    }
                }
            }
        }

        result
    }
}

#[derive(Debug, thiserror::Error)]
#[error("block {0:?} is outside of world extents")]
pub struct BlockOutOfBounds(pub BlockPos);

/// An in-memory world: a sparse set of chunks inside fixed extents.
///
/// Chunks are created on first write. Chunk residency requested through
/// [`ChunkStreamer`] is reference-counted; blocks stay readable whether
/// or not their chunk is resident, since this world never unloads data.
pub struct Zone {
    chunks: AHashMap<ChunkPos, Chunk>,
    residency: AHashMap<ChunkPos, u32>,
    extents: Vec3,
    spawn: Vec3,
}

impl Zone {
    pub fn new(extents: Vec3, spawn: Vec3) -> Self {
        Self {
            chunks: AHashMap::new(),
            residency: AHashMap::new(),
            extents: extents.abs(),
            spawn,
        }
    }

    /// Gets the chunk at `pos`.
    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Sets the block at `pos`. Returns an error if `pos`
    /// is outside the world extents.
    pub fn set_block(&mut self, pos: BlockPos, block: BlockId) -> Result<(), BlockOutOfBounds> {
        let chunk = self.chunk_for_write(pos)?;
        let (x, y, z) = pos.chunk_local();
        chunk.set(x, y, z, block);
        Ok(())
    }

    /// Sets or clears the fluid at `pos`.
    pub fn set_fluid(
        &mut self,
        pos: BlockPos,
        fluid: Option<FluidState>,
    ) -> Result<(), BlockOutOfBounds> {
        let chunk = self.chunk_for_write(pos)?;
        let (x, y, z) = pos.chunk_local();
        chunk.set_fluid(x, y, z, fluid);
        Ok(())
    }

    /// Fills the box of blocks between `a` and `b` (inclusive).
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, block: BlockId) -> Result<(), BlockOutOfBounds> {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.set_block(BlockPos::new(x, y, z), block)?;
                }
            }
        }
        Ok(())
    }

    /// Number of outstanding requests for the chunk at `pos`.
    pub fn residency(&self, pos: ChunkPos) -> u32 {
        self.residency.get(&pos).copied().unwrap_or(0)
    }

    /// Iterates over chunks with at least one outstanding request.
    pub fn resident_chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.residency.keys().copied()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        let p = pos.to_vec3();
        p.cmpge(-self.extents).all() && p.cmplt(self.extents).all()
    }

    fn chunk_for_write(&mut self, pos: BlockPos) -> Result<&mut Chunk, BlockOutOfBounds> {
        if !self.contains(pos) {
            return Err(BlockOutOfBounds(pos));
        }
        Ok(self.chunks.entry(pos.chunk()).or_insert_with(Chunk::new))
    }
}

impl ChunkStreamer for Zone {
    fn request_chunk(&mut self, pos: ChunkPos) {
        let count = self.residency.entry(pos).or_insert(0);
        *count += 1;
        log::trace!("Requested {:?} ({} holders)", pos, count);
    }

    fn release_chunk(&mut self, pos: ChunkPos) {
        match self.residency.get_mut(&pos) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.residency.remove(&pos);
                log::trace!("Chunk {:?} no longer resident", pos);
            }
            None => log::warn!("Released {:?}, which was never requested", pos),
        }
    }
}

impl World for Zone {
    fn block(&self, pos: BlockPos) -> Option<BlockId> {
        let chunk = self.chunk(pos.chunk())?;
        let (x, y, z) = pos.chunk_local();
        Some(chunk.get(x, y, z))
    }

    fn fluid(&self, pos: BlockPos) -> Option<FluidState> {
        let chunk = self.chunk(pos.chunk())?;
        let (x, y, z) = pos.chunk_local();
        chunk.fluid(x, y, z)
    }

    fn extents(&self) -> Vec3 {
        self.extents
    }

    fn spawn_position(&self) -> Vec3 {
        self.spawn
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use crate::{fluids, FluidId};

    use super::*;

    fn zone() -> Zone {
        Zone::new(vec3(64., 64., 64.), vec3(0.5, 2., 0.5))
    }

    #[test]
    fn block_to_chunk() {
        assert_eq!(BlockPos::new(0, 0, 0).chunk(), ChunkPos::new(0, 0, 0));
        assert_eq!(BlockPos::new(15, 15, 15).chunk(), ChunkPos::new(0, 0, 0));
        assert_eq!(BlockPos::new(-1, 0, 0).chunk(), ChunkPos::new(-1, 0, 0));
        assert_eq!(BlockPos::new(0, -1, 0).chunk(), ChunkPos::new(0, -1, 0));
        assert_eq!(BlockPos::new(0, 0, -17).chunk(), ChunkPos::new(0, 0, -2));
    }

    #[test]
    fn block_chunk_local_pos() {
        assert_eq!(BlockPos::new(0, 0, 0).chunk_local(), (0, 0, 0));
        assert_eq!(BlockPos::new(15, 14, 13).chunk_local(), (15, 14, 13));
        assert_eq!(BlockPos::new(-1, -1, -1).chunk_local(), (15, 15, 15));
    }

    #[test]
    fn unknown_chunks_read_as_air() {
        let zone = zone();
        assert_eq!(zone.block(BlockPos::new(3, 3, 3)), None);
        assert_eq!(zone.fluid(BlockPos::new(3, 3, 3)), None);
        assert!(!zone.is_solid(BlockPos::new(3, 3, 3)));
    }

    #[test]
    fn set_and_get() {
        let mut zone = zone();
        let pos = BlockPos::new(-20, 5, 33);
        zone.set_block(pos, BlockId::new(blocks::Stone)).unwrap();
        assert_eq!(zone.block(pos), Some(BlockId::new(blocks::Stone)));
        assert!(zone.is_solid(pos));
        assert_eq!(zone.block(pos.offset(1, 0, 0)), Some(BlockId::new(blocks::Air)));
    }

    #[test]
    fn writes_outside_extents_fail() {
        let mut zone = zone();
        assert!(zone
            .set_block(BlockPos::new(64, 0, 0), BlockId::new(blocks::Stone))
            .is_err());
        assert!(zone
            .set_block(BlockPos::new(-64, 0, 0), BlockId::new(blocks::Stone))
            .is_ok());
    }

    #[test]
    fn residency_is_reference_counted() {
        let mut zone = zone();
        let pos = ChunkPos::new(1, 0, -1);
        zone.request_chunk(pos);
        zone.request_chunk(pos);
        assert_eq!(zone.residency(pos), 2);
        zone.release_chunk(pos);
        assert_eq!(zone.resident_chunks().collect::<Vec<_>>(), vec![pos]);
        zone.release_chunk(pos);
        assert_eq!(zone.residency(pos), 0);
        assert_eq!(zone.resident_chunks().count(), 0);
    }

    #[test]
    fn intersect_floor_hits_y() {
        let mut zone = zone();
        zone.fill(
            BlockPos::new(-2, 0, -2),
            BlockPos::new(2, 0, 2),
            BlockId::new(blocks::Stone),
        )
        .unwrap();

        // Feet sunk slightly into the floor.
        let collider = Aabb::new(vec3(-0.3, 0.99, -0.3), vec3(0.3, 2.79, 0.3));
        let hit = zone.intersect_terrain(collider + vec3(0., 0.02, 0.), collider);
        assert_eq!(hit.hits, [false, true, false]);
        assert_eq!(hit.blocks.len(), 4);
        assert!(hit.fluids.is_empty());
    }

    #[test]
    fn intersect_wall_hits_x() {
        let mut zone = zone();
        zone.fill(
            BlockPos::new(1, 0, -2),
            BlockPos::new(1, 3, 2),
            BlockId::new(blocks::Stone),
        )
        .unwrap();

        let collider = Aabb::new(vec3(0.45, 1.0, 0.2), vec3(1.05, 2.8, 0.8));
        let hit = zone.intersect_terrain(collider + vec3(-0.1, 0., 0.), collider);
        assert_eq!(hit.hits, [true, false, false]);
    }

    #[test]
    fn falling_onto_an_edge_hits_y() {
        let mut zone = zone();
        zone.fill(
            BlockPos::new(-4, -4, -4),
            BlockPos::new(0, 0, 4),
            BlockId::new(blocks::Stone),
        )
        .unwrap();

        // Overlaps the ledge by 0.05 on X and sinks 0.3 into it on Y.
        let collider = Aabb::new(vec3(0.95, 0.7, 0.2), vec3(1.55, 2.5, 0.8));
        let hit = zone.intersect_terrain(collider + vec3(0., 0.4, 0.), collider);
        assert_eq!(hit.hits, [false, true, false]);
    }

    #[test]
    fn already_overlapping_blocks_do_not_hit() {
        let mut zone = zone();
        zone.set_block(BlockPos::new(0, 0, 0), BlockId::new(blocks::Stone))
            .unwrap();

        let collider = Aabb::new(vec3(0.2, 0.5, 0.2), vec3(0.8, 2.3, 0.8));
        let hit = zone.intersect_terrain(collider + vec3(0., -0.1, 0.), collider);
        assert!(!hit.any_hit());
        assert_eq!(hit.blocks.len(), 1);
    }

    #[test]
    fn touching_is_not_intersecting() {
        let mut zone = zone();
        zone.set_block(BlockPos::new(0, 0, 0), BlockId::new(blocks::Stone))
            .unwrap();
        let collider = Aabb::new(vec3(0.2, 1.0, 0.2), vec3(0.8, 2.8, 0.8));
        let hit = zone.intersect_terrain(collider + vec3(0., 0.1, 0.), collider);
        assert!(!hit.any_hit());
        assert!(hit.blocks.is_empty());
    }

    #[test]
    fn intersect_reports_non_solid_blocks_and_fluids() {
        let mut zone = zone();
        let pos = BlockPos::new(0, 1, 0);
        zone.set_block(pos, BlockId::new(blocks::TallGrass)).unwrap();
        zone.set_fluid(pos, Some(FluidState::new(FluidId::of(fluids::Water), 2)))
            .unwrap();

        let collider = Aabb::new(vec3(0.2, 1.1, 0.2), vec3(0.8, 2.9, 0.8));
        let hit = zone.intersect_terrain(collider, collider);
        assert!(!hit.any_hit());
        assert_eq!(hit.blocks, vec![(pos, BlockId::new(blocks::TallGrass))]);
        assert_eq!(hit.fluids.len(), 1);

        // Above the fluid surface (level 2 of 8 reaches y = 1.25).
        let collider = Aabb::new(vec3(0.2, 1.3, 0.2), vec3(0.8, 3.1, 0.8));
        assert!(zone.intersect_terrain(collider, collider).fluids.is_empty());
    }
}
