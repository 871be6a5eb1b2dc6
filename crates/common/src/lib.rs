//! Types shared by the physics and server crates: positions,
//! blocks and fluids, the world collaborator interface, and
//! the per-player chunk window.

pub mod block;
pub mod chunk;
pub mod entity;
pub mod fluid;
pub mod geom;
pub mod world;

pub use block::{blocks, BlockId};
pub use chunk::{Chunk, ChunkPos};
pub use entity::Body;
pub use fluid::{fluids, FluidId, FluidState};
pub use geom::{Aabb, Axis};
pub use world::{BlockOutOfBounds, BlockPos, ChunkStreamer, TerrainIntersection, World, Zone};
