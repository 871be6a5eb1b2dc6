//! Block API.

use std::any::{Any, TypeId};

use ahash::AHashMap;
use once_cell::sync::Lazy;

use crate::{BlockPos, Body};

pub mod blocks;

/// Function invoked when an entity collides with a block of a
/// kind implementing [`Collidable`]. Stored per kind in the registry.
type CollisionHandler = fn(BlockId, &mut dyn Body, BlockPos);

/// The block registry. Aids conversion between `BlockId` and the individual
/// block structs (`Dirt`, `Stone`, etc.). Also helps access shared properties.
#[derive(Default)]
struct Registry {
    /// Maps block struct TypeId to BlockId.kind.
    type_to_kind: AHashMap<TypeId, u32>,
    /// Maps BlockId.kind to struct TypeId.
    kind_to_type: Vec<TypeId>,
    /// Maps BlockId.kind to BlockDescriptor.
    kind_to_descriptor: Vec<BlockDescriptor>,
    /// Maps BlockId.kind to the collision callback, if the kind has one.
    kind_to_collision: Vec<Option<CollisionHandler>>,

    /// The next BlockId.kind to allocate.
    next_kind: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Block>(&mut self) -> &mut Self {
        self.push::<T>(None)
    }

    pub fn register_collidable<T: Collidable>(&mut self) -> &mut Self {
        self.push::<T>(Some(dispatch_collision::<T>))
    }

    fn push<T: Block>(&mut self, collision: Option<CollisionHandler>) -> &mut Self {
        self.type_to_kind.insert(TypeId::of::<T>(), self.next_kind);
        self.next_kind += 1;

        self.kind_to_type.push(TypeId::of::<T>());
        self.kind_to_descriptor.push(T::descriptor());
        self.kind_to_collision.push(collision);

        self
    }

    pub fn kind_of<T: Block>(&self) -> Option<u32> {
        self.type_to_kind.get(&TypeId::of::<T>()).copied()
    }

    pub fn type_of(&self, kind: u32) -> Option<TypeId> {
        self.kind_to_type.get(kind as usize).copied()
    }

    pub fn descriptor_of(&self, kind: u32) -> Option<BlockDescriptor> {
        self.kind_to_descriptor.get(kind as usize).copied()
    }

    pub fn collision_of(&self, kind: u32) -> Option<CollisionHandler> {
        self.kind_to_collision.get(kind as usize).copied().flatten()
    }
}

fn dispatch_collision<T: Collidable>(id: BlockId, entity: &mut dyn Body, pos: BlockPos) {
    if let Some(block) = id.cast::<T>() {
        block.on_entity_collision(entity, pos);
    }
}

/// The global block registry.
static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::new();

    use blocks::*;
    registry
        .register::<Air>()
        .register::<Dirt>()
        .register::<Stone>()
        .register::<Grass>()
        .register::<Sand>()
        .register::<Glass>()
        .register::<TallGrass>()
        .register_collidable::<Cactus>();

    registry
});

/// ID of a block state.
///
/// This struct can be thought of as a `Box<dyn Block>`, except
/// it provides additional utilities and is much more efficient
/// (it's just two integers with no heap allocations).
///
/// A block ID consists of two `u32`s: the block _kind_ ID,
/// which identifies which type this block is ("dirt", "cactus"),
/// and the state ID, which carries the block's data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(C)]
pub struct BlockId {
    kind: u32,
    state: u32,
}

static BLOCK_INVALID: &str =
    "block has not been registered with the block registry, or its state is invalid.";

impl BlockId {
    /// Creates a `BlockId` from the provided type which implements `Block`.
    ///
    /// # Panics
    /// Panics if `T` is not registered with the block registry.
    pub fn new<T: Block>(block: T) -> Self {
        let kind = REGISTRY.kind_of::<T>().expect(BLOCK_INVALID);
        let state = block.state_id();

        Self::from_raw_parts(kind, state)
    }

    /// Creates a block from a raw kind and state ID.
    ///
    /// # Warning
    /// It is possible to create an invalid BlockId using
    /// this method, which can result in panics (not memory unsafety).
    pub fn from_raw_parts(kind: u32, state: u32) -> Self {
        Self { kind, state }
    }

    /// Returns the descriptor of this block, which provides
    /// e.g. slug, display name and solidity.
    pub fn descriptor(self) -> BlockDescriptor {
        REGISTRY.descriptor_of(self.kind).expect(BLOCK_INVALID)
    }

    /// Attempts to get this block as a struct of type T.
    pub fn cast<T: Block>(self) -> Option<T> {
        if REGISTRY.type_of(self.kind).expect(BLOCK_INVALID) == TypeId::of::<T>() {
            Some(T::from_state_id(self.state).expect(BLOCK_INVALID))
        } else {
            None
        }
    }

    /// Returns whether this block is an instance of `T`.
    pub fn is<T: Block>(self) -> bool {
        self.cast::<T>().is_some()
    }

    /// Returns whether entities collide with this block.
    pub fn is_solid(self) -> bool {
        self.descriptor().is_solid()
    }

    /// Returns whether this block wants to be notified
    /// when an entity collides with it.
    pub fn receives_collisions(self) -> bool {
        REGISTRY.collision_of(self.kind).is_some()
    }

    /// Notifies this block that `entity` collided with it at `pos`.
    /// Returns `false` without doing anything if the block's kind
    /// does not implement [`Collidable`].
    pub fn entity_collision(self, entity: &mut dyn Body, pos: BlockPos) -> bool {
        match REGISTRY.collision_of(self.kind) {
            Some(handler) => {
                handler(self, entity, pos);
                true
            }
            None => false,
        }
    }

    /// Returns the numeric ID of this block's kind.
    pub fn kind(self) -> u32 {
        self.kind
    }

    /// Returns the block's data.
    pub fn state(self) -> u32 {
        self.state
    }
}

/// Implemented by structs representing block states.
///
/// For sanity, this trait should never be implemented outside
/// of the block module.
pub trait Block: Any + Sized {
    /// Gets the state ID of this block. A future call to `from_state_id()`
    /// with the value returned from this method must create a value equal to `self`.
    fn state_id(&self) -> u32;

    /// Creates a block state from a state ID previously returned
    /// from `Self::state_id()`.
    fn from_state_id(id: u32) -> Option<Self>;

    /// Gets the BlockDescriptor for this block kind.
    fn descriptor() -> BlockDescriptor;
}

/// Capability of blocks which react to entities colliding with them.
pub trait Collidable: Block {
    fn on_entity_collision(&self, entity: &mut dyn Body, pos: BlockPos);
}

/// A descriptor that exists for every block kind.
#[derive(Debug, Copy, Clone)]
pub struct BlockDescriptor {
    slug: &'static str,
    display_name: &'static str,
    solid: bool,
}

impl BlockDescriptor {
    pub const fn new(slug: &'static str, display_name: &'static str, solid: bool) -> Self {
        Self {
            slug,
            display_name,
            solid,
        }
    }

    /// Returns the block's slug, for example "dirt." This slug is
    /// stable and can be used for serialization to disk.
    pub fn slug(&self) -> &str {
        self.slug
    }

    /// Returns the block's display name which can be displayed to the user.
    pub fn display_name(&self) -> &str {
        self.display_name
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }
}
