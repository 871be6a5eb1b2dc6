//! The physics state of an entity and its per-tick integrator.

use ahash::AHashSet;
use common::{Aabb, Axis, BlockId, BlockPos, Body, FluidId, FluidState, TerrainIntersection, World};
use glam::{Quat, Vec3};

use crate::PhysicsSettings;

/// Position, motion and contact state of a physics-driven entity.
///
/// Each tick, [`PhysicsBody::tick`] applies drag, integrates the accumulated
/// force, and moves the body through the terrain in small sub-steps, stopping
/// motion along each axis on which it collides.
#[derive(Debug)]
pub struct PhysicsBody {
    mass: f32,
    drag: f32,
    settings: PhysicsSettings,
    bounds: Aabb,

    position: Vec3,
    velocity: Vec3,
    force: Vec3,
    rotation: Quat,

    grounded: bool,
    submerged: bool,
    enabled: bool,
    disposed: bool,
}

impl PhysicsBody {
    /// Creates a body at `position` with the given mass, quadratic drag
    /// coefficient and bounding volume (relative to the position).
    pub fn new(position: Vec3, mass: f32, drag: f32, bounds: Aabb) -> Self {
        Self::with_settings(position, mass, drag, bounds, PhysicsSettings::default())
    }

    /// Like [`PhysicsBody::new`] with explicit physics settings. As with
    /// [`PhysicsBody::teleport`], `position` is clamped on the first tick.
    pub fn with_settings(
        position: Vec3,
        mass: f32,
        drag: f32,
        bounds: Aabb,
        settings: PhysicsSettings,
    ) -> Self {
        assert!(mass > 0., "mass must be positive, got {}", mass);
        assert!(drag >= 0., "drag must not be negative, got {}", drag);
        Self {
            mass,
            drag,
            settings,
            bounds,
            position,
            velocity: Vec3::ZERO,
            force: Vec3::new(0., settings.gravity * mass, 0.),
            rotation: Quat::IDENTITY,
            grounded: false,
            submerged: false,
            enabled: true,
            disposed: false,
        }
    }

    /// Advances the body by `dt` seconds.
    ///
    /// With physics disabled, motion and pending forces are cleared and
    /// the position only moves if it lies outside the world extents.
    pub fn tick(&mut self, world: &dyn World, dt: f32) {
        self.check_alive();

        if self.enabled {
            self.integrate(world, dt);
        } else {
            self.velocity = Vec3::ZERO;
            self.force = Vec3::ZERO;
            self.grounded = false;
            self.submerged = false;
            self.clamp_to(world);
        }
    }

    fn integrate(&mut self, world: &dyn World, dt: f32) {
        self.grounded = false;
        self.submerged = false;

        self.force -= self.velocity * self.velocity.abs() * self.drag;
        self.velocity += self.force / self.mass * dt;

        let substeps = self.settings.substeps.max(1);
        let mut step = self.velocity * dt / substeps as f32;
        let mut contacts = Contacts::default();

        for _ in 0..substeps {
            self.collision_step(world, &mut step, &mut contacts);
        }

        contacts.notify(self);

        let mut fluid_drag = Vec3::ZERO;
        if let Some(fluid) = contacts.governing_fluid() {
            fluid_drag = fluid.drag(self.velocity);
            if fluid.fluid.is_liquid() && !self.grounded {
                self.submerged = true;
            }
        }

        self.force = Vec3::new(0., self.settings.gravity * self.mass, 0.) - fluid_drag;
    }

    /// Moves the body by `step` one axis at a time, vertical first.
    /// A collision along an axis cancels the step and velocity on it.
    fn collision_step(&mut self, world: &dyn World, step: &mut Vec3, contacts: &mut Contacts) {
        let mut position = self.position;

        for axis in SWEEP_ORDER.iter().copied() {
            let i = axis.index();
            if step[i] == 0. {
                continue;
            }

            let mut moved = position;
            moved[i] += step[i];
            let collider = self.bounds + moved;
            let hit = world.intersect_terrain(self.bounds + position, collider);
            contacts.merge(&hit);

            if hit.hit(axis) {
                if axis == Axis::Y {
                    self.grounded = !world.is_solid(block_above(collider));
                }
                step[i] = 0.;
                self.velocity[i] = 0.;
            } else {
                position = moved;
            }
        }

        if *step == Vec3::ZERO {
            // Resting bodies still touch what they rest in.
            let collider = self.bounds + position;
            contacts.merge(&world.intersect_terrain(collider, collider));
        }

        self.position = position;
        self.clamp_to(world);
    }

    fn clamp_to(&mut self, world: &dyn World) {
        let extents = world.extents();
        self.position = self.position.clamp(-extents, extents);
    }

    /// Adds a force to be integrated on the next tick.
    ///
    /// The force must be added before the next tick starts; whatever
    /// remains at the end of a tick is replaced by gravity and fluid drag.
    pub fn add_force(&mut self, force: Vec3) {
        self.check_alive();
        self.force += force;
    }

    /// Adds the force needed to reach `target_velocity` within one tick,
    /// limited to `±|max_force|` on each axis.
    pub fn move_toward(&mut self, target_velocity: Vec3, max_force: Vec3) {
        let limit = max_force.abs();
        let needed = (target_velocity - self.velocity) * self.mass - self.force;
        self.add_force(needed.clamp(-limit, limit));
    }

    /// Changes velocity by `impulse / mass` immediately.
    pub fn add_impulse(&mut self, impulse: Vec3) {
        self.check_alive();
        self.velocity += impulse / self.mass;
    }

    /// The bounding volume translated to the current position.
    pub fn collider(&self) -> Aabb {
        self.bounds + self.position
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Moves the body without physics, e.g. to respawn it.
    ///
    /// The position is not checked against the world here; the next
    /// tick clamps it to the world extents, with or without physics.
    pub fn teleport(&mut self, position: Vec3) {
        self.check_alive();
        self.position = position;
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.check_alive();
        self.velocity = velocity;
    }

    /// The force that will be integrated on the next tick.
    pub fn accumulated_force(&self) -> Vec3 {
        self.force
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Unit vector the body faces (+Z rotated by the body's rotation).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Unit vector to the body's right (+X rotated by the body's rotation).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_submerged(&self) -> bool {
        self.submerged
    }

    pub fn physics_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_physics_enabled(&mut self, enabled: bool) {
        self.check_alive();
        self.enabled = enabled;
    }

    /// Marks the body as disposed. Later operations on it are bugs.
    /// Calling this more than once has no further effect.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn check_alive(&self) {
        debug_assert!(!self.disposed, "operation on a disposed physics body");
    }
}

impl Body for PhysicsBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn add_force(&mut self, force: Vec3) {
        PhysicsBody::add_force(self, force)
    }

    fn add_impulse(&mut self, impulse: Vec3) {
        PhysicsBody::add_impulse(self, impulse)
    }
}

const SWEEP_ORDER: [Axis; 3] = [Axis::Y, Axis::X, Axis::Z];

/// The block checked for open space above a collider which hit something
/// vertically. If it is solid, the hit was a ceiling rather than the ground.
fn block_above(collider: Aabb) -> BlockPos {
    let center = collider.center();
    BlockPos::new(
        center.x.floor() as i32,
        collider.max.y.round() as i32,
        center.z.floor() as i32,
    )
}

/// Distinct blocks and fluids touched during one tick, in the order
/// they were first touched.
#[derive(Default)]
struct Contacts {
    seen_blocks: AHashSet<(BlockPos, BlockId)>,
    blocks: Vec<(BlockPos, BlockId)>,
    seen_fluids: AHashSet<(BlockPos, FluidId)>,
    fluids: Vec<(BlockPos, FluidState)>,
}

impl Contacts {
    fn merge(&mut self, hit: &TerrainIntersection) {
        for &(pos, block) in &hit.blocks {
            if self.seen_blocks.insert((pos, block)) {
                self.blocks.push((pos, block));
            }
        }
        for &(pos, fluid) in &hit.fluids {
            if self.seen_fluids.insert((pos, fluid.fluid)) {
                self.fluids.push((pos, fluid));
            }
        }
    }

    fn notify(&self, body: &mut PhysicsBody) {
        for &(pos, block) in &self.blocks {
            if block.is_solid() && block.entity_collision(body, pos) {
                log::trace!("Entity collided with {:?} at {:?}", block, pos);
            }
        }
        for &(pos, fluid) in &self.fluids {
            if fluid.fluid.entity_contact(body, pos, fluid.level) {
                log::trace!("Entity touched {:?} at {:?}", fluid, pos);
            }
        }
    }

    /// The fluid with the highest level. Between full cells of
    /// different fluids, the denser one wins.
    fn governing_fluid(&self) -> Option<FluidState> {
        let mut governing: Option<FluidState> = None;
        for &(_, fluid) in &self.fluids {
            governing = match governing {
                Some(best)
                    if fluid.level < best.level
                        || (fluid.level == best.level
                            && !(fluid.is_full() && fluid.fluid.density() > best.fluid.density())) =>
                {
                    Some(best)
                }
                _ => Some(fluid),
            };
        }
        governing
    }
}
