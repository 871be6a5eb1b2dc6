//! The view of an entity offered to blocks and fluids when
//! they are notified about contact with it.

use glam::Vec3;

pub mod player;

/// A physics-driven entity as seen by world callbacks.
pub trait Body {
    fn position(&self) -> Vec3;

    /// Velocity in blocks per second.
    fn velocity(&self) -> Vec3;

    fn mass(&self) -> f32;

    /// Adds a force to be integrated on the entity's next tick.
    ///
    /// Forces still pending when the entity finishes a physics pass
    /// are discarded, so world callbacks should prefer impulses.
    fn add_force(&mut self, force: Vec3);

    /// Changes the entity's momentum immediately.
    fn add_impulse(&mut self, impulse: Vec3);
}
