//! Fluid API. Fluids live alongside blocks, one per block cell,
//! filling the bottom `level / MAX_FLUID_LEVEL` of the cell.

use std::any::{Any, TypeId};

use ahash::AHashMap;
use glam::Vec3;
use once_cell::sync::Lazy;

use crate::{Aabb, BlockPos, Body};

/// The level of a full fluid cell.
pub const MAX_FLUID_LEVEL: u8 = 8;

type ContactHandler = fn(&mut dyn Body, BlockPos, u8);

#[derive(Default)]
struct Registry {
    type_to_id: AHashMap<TypeId, u32>,
    descriptors: Vec<FluidDescriptor>,
    contact: Vec<Option<ContactHandler>>,
}

impl Registry {
    fn register<T: Fluid>(&mut self) -> &mut Self {
        self.push::<T>(None)
    }

    fn register_contactable<T: Contactable>(&mut self) -> &mut Self {
        self.push::<T>(Some(dispatch_contact::<T>))
    }

    fn push<T: Fluid>(&mut self, contact: Option<ContactHandler>) -> &mut Self {
        let id = self.descriptors.len() as u32;
        self.type_to_id.insert(TypeId::of::<T>(), id);
        self.descriptors.push(T::descriptor());
        self.contact.push(contact);
        self
    }
}

fn dispatch_contact<T: Contactable>(entity: &mut dyn Body, pos: BlockPos, level: u8) {
    T::default().on_entity_contact(entity, pos, level);
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::default();

    use fluids::*;
    registry
        .register::<Water>()
        .register_contactable::<Lava>()
        .register::<Steam>();

    registry
});

static FLUID_INVALID: &str = "fluid has not been registered with the fluid registry";

/// Whether a fluid is a liquid or a gas. Only liquids submerge entities.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FluidKind {
    Liquid,
    Gas,
}

#[derive(Debug, Copy, Clone)]
pub struct FluidDescriptor {
    slug: &'static str,
    density: f32,
    kind: FluidKind,
}

impl FluidDescriptor {
    pub const fn new(slug: &'static str, density: f32, kind: FluidKind) -> Self {
        Self {
            slug,
            density,
            kind,
        }
    }

    pub fn slug(&self) -> &str {
        self.slug
    }

    /// Drag per unit of squared speed exerted by a full cell of this fluid.
    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn kind(&self) -> FluidKind {
        self.kind
    }
}

/// Implemented by the unit structs in [`fluids`].
pub trait Fluid: Any + Default {
    fn descriptor() -> FluidDescriptor;
}

/// Capability of fluids which react to entities touching them.
pub trait Contactable: Fluid {
    fn on_entity_contact(&self, entity: &mut dyn Body, pos: BlockPos, level: u8);
}

/// ID of a fluid kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FluidId(u32);

impl FluidId {
    /// # Panics
    /// Panics if `T` is not registered with the fluid registry.
    pub fn of<T: Fluid>(_fluid: T) -> Self {
        Self(*REGISTRY.type_to_id.get(&TypeId::of::<T>()).expect(FLUID_INVALID))
    }

    pub fn descriptor(self) -> FluidDescriptor {
        *REGISTRY.descriptors.get(self.0 as usize).expect(FLUID_INVALID)
    }

    pub fn density(self) -> f32 {
        self.descriptor().density()
    }

    pub fn is_liquid(self) -> bool {
        self.descriptor().kind() == FluidKind::Liquid
    }

    /// Returns whether this fluid wants to be notified when an entity touches it.
    pub fn receives_contacts(self) -> bool {
        self.contact_handler().is_some()
    }

    /// Notifies this fluid that `entity` touched it at `pos`.
    /// Returns `false` if the fluid does not implement [`Contactable`].
    pub fn entity_contact(self, entity: &mut dyn Body, pos: BlockPos, level: u8) -> bool {
        match self.contact_handler() {
            Some(handler) => {
                handler(entity, pos, level);
                true
            }
            None => false,
        }
    }

    fn contact_handler(self) -> Option<ContactHandler> {
        REGISTRY.contact.get(self.0 as usize).copied().flatten()
    }
}

/// A fluid occupying a block cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FluidState {
    pub fluid: FluidId,
    pub level: u8,
}

impl FluidState {
    pub fn new(fluid: FluidId, level: u8) -> Self {
        debug_assert!(
            level > 0 && level <= MAX_FLUID_LEVEL,
            "fluid level {} out of range",
            level
        );
        Self { fluid, level }
    }

    pub fn is_full(self) -> bool {
        self.level == MAX_FLUID_LEVEL
    }

    /// The volume this fluid occupies inside the cell at `pos`.
    pub fn bounds(self, pos: BlockPos) -> Aabb {
        let min = pos.to_vec3();
        let height = self.level as f32 / MAX_FLUID_LEVEL as f32;
        Aabb {
            min,
            max: min + Vec3::new(1., height, 1.),
        }
    }

    /// Drag exerted on a body moving at `velocity`, pointing along the velocity.
    pub fn drag(self, velocity: Vec3) -> Vec3 {
        let fill = self.level as f32 / MAX_FLUID_LEVEL as f32;
        velocity * velocity.abs() * self.fluid.density() * fill
    }
}

pub mod fluids {
    //! Definitions for each fluid.

    use glam::Vec3;

    use super::{Contactable, Fluid, FluidDescriptor, FluidKind, MAX_FLUID_LEVEL};
    use crate::{BlockPos, Body};

    #[derive(Copy, Clone, Debug, Default)]
    pub struct Water;

    impl Fluid for Water {
        fn descriptor() -> FluidDescriptor {
            FluidDescriptor::new("water", 1., FluidKind::Liquid)
        }
    }

    /// Thick and slow. Damps the motion of anything touching it.
    #[derive(Copy, Clone, Debug, Default)]
    pub struct Lava;

    /// Fraction of an entity's momentum a full lava cell removes per tick.
    const LAVA_DAMPING: f32 = 0.5;

    impl Fluid for Lava {
        fn descriptor() -> FluidDescriptor {
            FluidDescriptor::new("lava", 3., FluidKind::Liquid)
        }
    }

    impl Contactable for Lava {
        fn on_entity_contact(&self, entity: &mut dyn Body, pos: BlockPos, level: u8) {
            let fill = level as f32 / MAX_FLUID_LEVEL as f32;
            let damping: Vec3 = -entity.velocity() * entity.mass() * LAVA_DAMPING * fill;
            log::trace!("Lava at {:?} damping entity by {:?}", pos, damping);
            entity.add_impulse(damping);
        }
    }

    #[derive(Copy, Clone, Debug, Default)]
    pub struct Steam;

    impl Fluid for Steam {
        fn descriptor() -> FluidDescriptor {
            FluidDescriptor::new("steam", 0.05, FluidKind::Gas)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluid_ids_and_kinds() {
        let water = FluidId::of(fluids::Water);
        let steam = FluidId::of(fluids::Steam);
        assert_ne!(water, steam);
        assert!(water.is_liquid());
        assert!(!steam.is_liquid());
        assert_eq!(water.descriptor().slug(), "water");
        assert!(FluidId::of(fluids::Lava).density() > water.density());
    }

    #[test]
    fn contact_capability() {
        assert!(!FluidId::of(fluids::Water).receives_contacts());
        assert!(FluidId::of(fluids::Lava).receives_contacts());
    }

    #[test]
    fn partial_cell_bounds() {
        let state = FluidState::new(FluidId::of(fluids::Water), 4);
        let bounds = state.bounds(BlockPos::new(1, 2, 3));
        assert_eq!(bounds.min, Vec3::new(1., 2., 3.));
        assert_eq!(bounds.max, Vec3::new(2., 2.5, 4.));
        assert!(!state.is_full());
    }

    #[test]
    fn drag_opposes_motion_quadratically() {
        let state = FluidState::new(FluidId::of(fluids::Water), MAX_FLUID_LEVEL);
        let drag = state.drag(Vec3::new(2., -1., 0.));
        assert_eq!(drag, Vec3::new(4., -1., 0.));
    }
}
