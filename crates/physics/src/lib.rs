//! Physics integration and collision resolution for entities
//! moving through the voxel terrain.

pub mod body;
pub mod entity;
pub mod raycast;

pub use body::PhysicsBody;
pub use entity::{Actor, Behavior, Entity};
pub use raycast::{raycast, BlockFace, RayHit};

use serde::Deserialize;

/// Gravitational acceleration along Y, in blocks per second squared.
pub const GRAVITY: f32 = -9.81;

/// Number of sub-steps each tick's displacement is split into.
pub const SUBSTEPS: u32 = 10;

/// Tunables shared by every physics body.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: f32,
    pub substeps: u32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            substeps: SUBSTEPS,
        }
    }
}
