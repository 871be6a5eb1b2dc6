use ahash::AHashMap;
use common::{World, Zone};
use physics::{Actor, Entity, PhysicsBody};

use crate::{
    config::Config,
    player::{Player, PlayerInput},
};

/// Handle to an entity in a [`Game`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

/// Uberstruct containing the entire game state: the world
/// and every entity living in it.
pub struct Game {
    zone: Zone,
    config: Config,

    /// Entities that aren't players.
    actors: AHashMap<EntityId, Box<dyn Actor>>,
    /// Players are kept apart so their input can be set.
    players: AHashMap<EntityId, Entity<Player>>,
    next_id: u64,
    ticks: u64,
}

impl Game {
    pub fn new(zone: Zone, config: Config) -> Self {
        Self {
            zone,
            config,
            actors: AHashMap::new(),
            players: AHashMap::new(),
            next_id: 0,
            ticks: 0,
        }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn zone_mut(&mut self) -> &mut Zone {
        &mut self.zone
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Spawns a player at the world spawn point.
    pub fn spawn_player(&mut self) -> EntityId {
        let player = Player::spawn(
            &mut self.zone,
            self.config.player,
            self.config.physics,
            self.config.load_radius,
        );
        let id = self.allocate_id();
        self.players.insert(id, player);
        id
    }

    /// Adds an entity of any other kind.
    pub fn add_actor(&mut self, actor: Box<dyn Actor>) -> EntityId {
        let id = self.allocate_id();
        self.actors.insert(id, actor);
        id
    }

    pub fn player(&self, id: EntityId) -> Option<&Entity<Player>> {
        self.players.get(&id)
    }

    pub fn set_player_input(&mut self, id: EntityId, input: PlayerInput) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.behavior_mut().set_input(input);
                true
            }
            None => false,
        }
    }

    /// Gets the physics body of any entity.
    pub fn body(&self, id: EntityId) -> Option<&PhysicsBody> {
        self.players
            .get(&id)
            .map(Entity::body)
            .or_else(|| self.actors.get(&id).map(|actor| actor.body()))
    }

    pub fn entity_count(&self) -> usize {
        self.players.len() + self.actors.len()
    }

    /// Removes an entity, releasing whatever it held in the world
    /// and disposing it. Returns whether the entity existed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if let Some(mut player) = self.players.remove(&id) {
            player.remove(&mut self.zone);
            true
        } else if let Some(mut actor) = self.actors.remove(&id) {
            actor.remove(&mut self.zone);
            true
        } else {
            false
        }
    }

    /// Advances every entity by one tick.
    pub fn tick(&mut self) {
        let dt = self.config.tick_length();
        let zone: &mut dyn World = &mut self.zone;

        for player in self.players.values_mut() {
            player.tick(zone, dt);
        }
        for actor in self.actors.values_mut() {
            actor.tick(zone, dt);
        }

        self.ticks += 1;
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        let ids: Vec<EntityId> = self.players.keys().chain(self.actors.keys()).copied().collect();
        for id in ids {
            self.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use common::{blocks, Aabb, BlockId, BlockPos, ChunkPos};
    use glam::{vec3, Vec3};
    use physics::{Behavior, BlockFace};

    use super::*;

    struct Crate;

    impl Behavior for Crate {
        fn on_update(&mut self, _body: &mut PhysicsBody, _world: &mut dyn World, _dt: f32) {}

        fn movement(&self) -> Vec3 {
            Vec3::ZERO
        }

        fn looking_direction(&self) -> Vec3 {
            Vec3::Z
        }

        fn target_side(&self) -> Option<BlockFace> {
            None
        }

        fn target_position(&self) -> Option<BlockPos> {
            None
        }
    }

    fn game() -> Game {
        let mut zone = Zone::new(vec3(128., 64., 128.), vec3(0.5, 2., 0.5));
        zone.fill(
            BlockPos::new(-16, 0, -16),
            BlockPos::new(15, 0, 15),
            BlockId::new(blocks::Stone),
        )
        .unwrap();
        Game::new(zone, Config::default())
    }

    #[test]
    fn ticks_every_entity() {
        let mut game = game();
        let player = game.spawn_player();
        let crate_ = game.add_actor(Box::new(Entity::new(
            PhysicsBody::new(vec3(4.5, 10., 4.5), 1., 0., Aabb::unit(Vec3::ZERO)),
            Crate,
        )));
        assert_eq!(game.entity_count(), 2);

        game.tick();
        assert_eq!(game.ticks(), 1);
        assert!(game.body(player).unwrap().position().y < 2.);
        assert!(game.body(crate_).unwrap().position().y < 10.);
    }

    #[test]
    fn player_input_is_routed() {
        let mut game = game();
        let player = game.spawn_player();
        for _ in 0..40 {
            game.tick();
        }
        assert!(game.set_player_input(
            player,
            PlayerInput {
                strafe: 1.,
                ..PlayerInput::default()
            }
        ));
        for _ in 0..20 {
            game.tick();
        }
        assert!(game.body(player).unwrap().position().x > 0.5);
        assert!(!game.set_player_input(EntityId(99), PlayerInput::default()));
    }

    #[test]
    fn removing_a_player_releases_its_chunks() {
        let mut game = game();
        let player = game.spawn_player();
        assert_eq!(game.zone().residency(ChunkPos::new(0, 0, 0)), 1);

        assert!(game.remove(player));
        assert!(!game.remove(player));
        assert!(game.player(player).is_none());
        assert_eq!(game.zone().resident_chunks().count(), 0);
        assert_eq!(game.entity_count(), 0);
    }

    #[test]
    fn overlapping_windows_share_chunks() {
        let mut game = game();
        let a = game.spawn_player();
        let _b = game.spawn_player();
        assert_eq!(game.zone().residency(ChunkPos::new(0, 0, 0)), 2);

        game.remove(a);
        assert_eq!(game.zone().residency(ChunkPos::new(0, 0, 0)), 1);
        assert_eq!(game.zone().resident_chunks().count(), 27);
    }
}
