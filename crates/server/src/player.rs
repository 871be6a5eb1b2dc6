use common::{entity::player::ChunkWindow, Aabb, BlockPos, ChunkPos, World};
use glam::{vec3, EulerRot, Quat, Vec3};
use physics::{raycast, Behavior, BlockFace, Entity, PhysicsBody, PhysicsSettings, RayHit};

use crate::config::PlayerSettings;

/// Height of a player's eyes above their feet.
pub const EYE_HEIGHT: f32 = 1.62;

/// Collision box of a player, relative to their feet.
pub fn player_bounds() -> Aabb {
    Aabb::new(vec3(-0.3, 0., -0.3), vec3(0.3, 1.8, 0.3))
}

/// What a player's controls are currently asking for.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PlayerInput {
    /// -1 to 1, positive is forward.
    pub forward: f32,
    /// -1 to 1, positive is to the right.
    pub strafe: f32,
    pub jump: bool,
    /// Rotation about +Y, in radians.
    pub yaw: f32,
    /// Rotation about the player's X axis, in radians. Positive looks down.
    pub pitch: f32,
}

/// Behavior of a player: walking, jumping, block targeting,
/// and keeping the chunks around it resident.
#[derive(Debug)]
pub struct Player {
    settings: PlayerSettings,
    input: PlayerInput,
    window: Option<ChunkWindow>,
    movement: Vec3,
    looking: Vec3,
    target: Option<RayHit>,
}

impl Player {
    /// Spawns a player at the world's spawn point and requests
    /// the chunks around it.
    pub fn spawn(
        world: &mut dyn World,
        settings: PlayerSettings,
        physics: PhysicsSettings,
        load_radius: u32,
    ) -> Entity<Player> {
        let position = world.spawn_position();
        let body = PhysicsBody::with_settings(
            position,
            settings.mass,
            settings.drag,
            player_bounds(),
            physics,
        );
        let window = ChunkWindow::new(ChunkPos::from_pos(position), load_radius, world);
        log::info!("Spawned player at {:?}", position);

        Entity::new(
            body,
            Player {
                settings,
                input: PlayerInput::default(),
                window: Some(window),
                movement: Vec3::ZERO,
                looking: Vec3::Z,
                target: None,
            },
        )
    }

    pub fn input(&self) -> PlayerInput {
        self.input
    }

    /// Sets the input applied from the next update on.
    pub fn set_input(&mut self, input: PlayerInput) {
        self.input = input;
    }

    /// The chunk window, or `None` once the player has been removed.
    pub fn window(&self) -> Option<ChunkWindow> {
        self.window
    }

    /// The block the player is looking at, if it's within reach.
    pub fn target(&self) -> Option<RayHit> {
        self.target
    }

    fn walk(&mut self, body: &mut PhysicsBody) {
        let heading = Quat::from_rotation_y(self.input.yaw);
        let wish = heading * vec3(self.input.strafe, 0., self.input.forward);
        self.movement = if wish.length_squared() > 1. {
            wish.normalize()
        } else {
            wish
        };

        // Horizontal only; gravity and jumping own the vertical axis.
        let max = self.settings.max_force;
        body.move_toward(self.movement * self.settings.walk_speed, vec3(max, 0., max));

        if self.input.jump && body.is_grounded() {
            body.add_impulse(Vec3::Y * self.settings.jump_impulse);
        }
    }
}

impl Behavior for Player {
    fn on_update(&mut self, body: &mut PhysicsBody, world: &mut dyn World, _dt: f32) {
        body.set_rotation(Quat::from_euler(
            EulerRot::YXZ,
            self.input.yaw,
            self.input.pitch,
            0.,
        ));
        self.looking = body.forward();

        if body.physics_enabled() {
            self.walk(body);
        }

        let eye = body.position() + Vec3::Y * EYE_HEIGHT;
        self.target = raycast(eye, self.looking, self.settings.reach, |pos| {
            world.is_solid(pos)
        });

        if let Some(window) = &mut self.window {
            window.update_for_position(body.position(), world);
        }
    }

    fn movement(&self) -> Vec3 {
        self.movement
    }

    fn looking_direction(&self) -> Vec3 {
        self.looking
    }

    fn target_side(&self) -> Option<BlockFace> {
        self.target.map(|hit| hit.face)
    }

    fn target_position(&self) -> Option<BlockPos> {
        self.target.map(|hit| hit.pos)
    }

    fn on_remove(&mut self, _body: &mut PhysicsBody, world: &mut dyn World) {
        if let Some(window) = self.window.take() {
            window.close(world);
        }
    }
}
