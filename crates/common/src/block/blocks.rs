//! Definitions for each block.

use glam::Vec3;

use super::{Block, BlockDescriptor, Collidable};
use crate::{BlockPos, Body};

macro_rules! unit_block {
    ($(#[$meta:meta])* $name:ident, $slug:literal, $display_name:literal, solid: $solid:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl Block for $name {
            fn state_id(&self) -> u32 {
                0
            }

            fn from_state_id(id: u32) -> Option<Self> {
                if id == 0 {
                    Some($name)
                } else {
                    None
                }
            }

            fn descriptor() -> BlockDescriptor {
                BlockDescriptor::new($slug, $display_name, $solid)
            }
        }
    };
}

unit_block!(Air, "air", "Air", solid: false);
unit_block!(Dirt, "dirt", "Dirt", solid: true);
unit_block!(Stone, "stone", "Stone", solid: true);
unit_block!(Grass, "grass", "Grass", solid: true);
unit_block!(Sand, "sand", "Sand", solid: true);
unit_block!(Glass, "glass", "Glass", solid: true);
unit_block!(
    /// Decorative plant. Entities pass through it.
    TallGrass,
    "tall_grass",
    "Tall Grass",
    solid: false
);
unit_block!(
    /// Pushes away entities that bump into it.
    Cactus,
    "cactus",
    "Cactus",
    solid: true
);

/// Horizontal speed given to entities pushed away, in blocks per second.
const CACTUS_PUSH: f32 = 2.;

impl Collidable for Cactus {
    fn on_entity_collision(&self, entity: &mut dyn Body, pos: BlockPos) {
        let center = pos.to_vec3() + Vec3::splat(0.5);
        let mut away = entity.position() - center;
        away.y = 0.;
        let push = away.normalize_or_zero() * CACTUS_PUSH * entity.mass();
        log::trace!("Cactus at {:?} pushing entity by {:?}", pos, push);
        entity.add_impulse(push);
    }
}
