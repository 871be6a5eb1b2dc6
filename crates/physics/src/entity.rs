//! Entities: a physics body paired with kind-specific behavior.

use common::{BlockPos, World};
use glam::Vec3;

use crate::{BlockFace, PhysicsBody};

/// Behavior layered on top of a [`PhysicsBody`] by each kind of entity.
pub trait Behavior {
    /// Called once per tick, after the physics pass, with the same `dt`.
    fn on_update(&mut self, body: &mut PhysicsBody, world: &mut dyn World, dt: f32);

    /// The direction the entity wants to move in, in world space.
    fn movement(&self) -> Vec3;

    fn looking_direction(&self) -> Vec3;

    /// The side of the block the entity is aiming at, if any.
    fn target_side(&self) -> Option<BlockFace>;

    /// The block the entity is aiming at, if any.
    fn target_position(&self) -> Option<BlockPos>;

    /// Called when the entity is taken out of a world it was ticking in,
    /// before it is disposed.
    fn on_remove(&mut self, _body: &mut PhysicsBody, _world: &mut dyn World) {}

    /// Cleanup run once when the entity is disposed.
    fn on_dispose(&mut self, _body: &mut PhysicsBody) {}
}

/// A live entity in the world.
pub struct Entity<B: Behavior> {
    body: PhysicsBody,
    behavior: B,
}

impl<B: Behavior> Entity<B> {
    pub fn new(body: PhysicsBody, behavior: B) -> Self {
        Self { body, behavior }
    }

    /// Runs the physics pass, then the behavior's update hook.
    pub fn tick(&mut self, world: &mut dyn World, dt: f32) {
        self.body.tick(&*world, dt);
        self.behavior.on_update(&mut self.body, world, dt);
    }

    /// Detaches the entity from `world` and disposes it.
    pub fn remove(&mut self, world: &mut dyn World) {
        if self.body.is_disposed() {
            return;
        }
        self.behavior.on_remove(&mut self.body, world);
        self.dispose();
    }

    /// Runs the behavior's cleanup and retires the body.
    /// Only the first call has any effect.
    pub fn dispose(&mut self) {
        if self.body.is_disposed() {
            return;
        }
        self.behavior.on_dispose(&mut self.body);
        self.body.dispose();
        log::debug!("Disposed entity at {:?}", self.body.position());
    }

    pub fn is_disposed(&self) -> bool {
        self.body.is_disposed()
    }

    pub fn body(&self) -> &PhysicsBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut PhysicsBody {
        &mut self.body
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }
}

impl<B: Behavior> Drop for Entity<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Object-safe view of an [`Entity`] of any behavior, so entities
/// of different kinds can be ticked together.
pub trait Actor {
    fn tick(&mut self, world: &mut dyn World, dt: f32);

    fn remove(&mut self, world: &mut dyn World);

    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;

    fn body(&self) -> &PhysicsBody;
}

impl<B: Behavior> Actor for Entity<B> {
    fn tick(&mut self, world: &mut dyn World, dt: f32) {
        Entity::tick(self, world, dt)
    }

    fn remove(&mut self, world: &mut dyn World) {
        Entity::remove(self, world)
    }

    fn dispose(&mut self) {
        Entity::dispose(self)
    }

    fn is_disposed(&self) -> bool {
        Entity::is_disposed(self)
    }

    fn body(&self) -> &PhysicsBody {
        Entity::body(self)
    }
}
