use std::{
    panic, thread,
    time::{Duration, Instant},
};

use common::{blocks, BlockId, BlockPos, BlockOutOfBounds, Zone};
use panic::AssertUnwindSafe;

pub use config::{Config, ConfigError, PlayerSettings, WorldConfig};
pub use game::{EntityId, Game};
pub use player::{Player, PlayerInput};

pub mod config;
pub mod game;
pub mod player;

/// The top-level server state.
pub struct Server {
    game: Game,
    tick_length: Duration,
}

impl Server {
    /// Creates a new `Server` running `game` at the configured tick rate.
    pub fn new(game: Game) -> Self {
        let tick_length = Duration::from_secs(1) / game.config().tps.max(1);
        Self { game, tick_length }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    /// Runs `ticks` ticks at a fixed rate.
    pub fn run_for(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.run_tick();
        }
    }

    /// Runs the server forever.
    pub fn run(&mut self) {
        loop {
            self.run_tick();
        }
    }

    fn run_tick(&mut self) {
        let start = Instant::now();

        if let Err(e) = panic::catch_unwind(AssertUnwindSafe(|| {
            self.game.tick();
        })) {
            log::error!("The server panicked while ticking: {:?}", e);
            log::error!("This is a bug. Please report it.");
            log::error!("We will try to recover, but the game state may have become corrupted. We advise that you restart the server.");
        }

        let elapsed = start.elapsed();
        if elapsed > self.tick_length {
            log::warn!("Tick took too long! ({}ms)", elapsed.as_millis());
        } else {
            thread::sleep(self.tick_length - elapsed);
        }
    }
}

/// Height of the top of the flat world's ground layer.
pub const GROUND_LEVEL: i32 = 64;

/// Builds a world whose ground is stone, capped with dirt and grass,
/// within `radius` blocks of the origin on X and Z.
pub fn flat_world(config: &WorldConfig, radius: i32) -> Result<Zone, BlockOutOfBounds> {
    log::info!("Generating flat world...");
    let start = Instant::now();
    let mut zone = Zone::new(config.extents, config.spawn);

    let (a, b) = (-radius, radius - 1);
    zone.fill(
        BlockPos::new(a, 0, a),
        BlockPos::new(b, GROUND_LEVEL - 4, b),
        BlockId::new(blocks::Stone),
    )?;
    zone.fill(
        BlockPos::new(a, GROUND_LEVEL - 3, a),
        BlockPos::new(b, GROUND_LEVEL - 1, b),
        BlockId::new(blocks::Dirt),
    )?;
    zone.fill(
        BlockPos::new(a, GROUND_LEVEL, a),
        BlockPos::new(b, GROUND_LEVEL, b),
        BlockId::new(blocks::Grass),
    )?;

    log::info!("World generated in {:?}", start.elapsed());
    Ok(zone)
}

#[cfg(test)]
mod tests {
    use common::World;
    use glam::vec3;

    use super::*;

    #[test]
    fn flat_world_layers() {
        let zone = flat_world(&WorldConfig::default(), 8).unwrap();
        assert!(zone.block(BlockPos::new(0, 0, 0)).unwrap().is::<blocks::Stone>());
        assert!(zone.block(BlockPos::new(-8, 62, 7)).unwrap().is::<blocks::Dirt>());
        assert!(zone.block(BlockPos::new(3, 64, -3)).unwrap().is::<blocks::Grass>());
        assert!(!zone.is_solid(BlockPos::new(3, 65, -3)));
        assert!(!zone.is_solid(BlockPos::new(8, 64, 0)));
    }

    #[test]
    fn flat_world_outside_extents_fails() {
        let config = WorldConfig {
            extents: vec3(4., 256., 4.),
            ..WorldConfig::default()
        };
        assert!(flat_world(&config, 8).is_err());
    }

    #[test]
    fn player_lands_on_flat_world() {
        let mut config = Config::default();
        config.tps = 1000;
        let zone = flat_world(&config.world, 4).unwrap();
        let mut server = Server::new(Game::new(zone, config));
        let player = server.game_mut().spawn_player();

        server.run_for(100);
        let body = server.game().body(player).unwrap();
        assert!(body.is_grounded());
        assert!((body.position().y - 65.).abs() < 0.01);
        assert_eq!(server.game().ticks(), 100);
    }
}
