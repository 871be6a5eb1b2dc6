use std::env;

use anyhow::Context;
use server::{flat_world, Config, Game, PlayerInput, Server};
use simple_logger::SimpleLogger;

/// Half-width of the generated ground, in blocks.
const WORLD_RADIUS: i32 = 64;
/// Default number of ticks the demo player walks for.
const WALK_TICKS: u64 = 200;

fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()?;

    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let ticks = match args.next() {
        Some(ticks) => ticks
            .parse::<u64>()
            .with_context(|| format!("invalid tick count '{}'", ticks))?,
        None => WALK_TICKS,
    };
    log::info!("Starting server at {} TPS", config.tps);

    let zone = flat_world(&config.world, WORLD_RADIUS).context("failed to generate world")?;
    let mut server = Server::new(Game::new(zone, config));

    let player = server.game_mut().spawn_player();
    server.game_mut().set_player_input(
        player,
        PlayerInput {
            forward: 1.,
            yaw: 0.3,
            pitch: 0.6,
            ..PlayerInput::default()
        },
    );

    let tps = u64::from(server.game().config().tps);
    for tick in 1..=ticks {
        server.run_for(1);
        if tick % tps != 0 && tick != ticks {
            continue;
        }

        let game = server.game();
        if let Some(entity) = game.player(player) {
            let body = entity.body();
            log::info!(
                "t={:.2}s position={:?} grounded={} resident chunks={} target={:?}",
                tick as f64 / tps as f64,
                body.position(),
                body.is_grounded(),
                game.zone().resident_chunks().count(),
                entity.behavior().target().map(|hit| hit.pos),
            );
        }
    }
    log::info!("Ran {} ticks", server.game().ticks());

    server.game_mut().remove(player);
    log::info!(
        "Player removed; {} chunks still resident",
        server.game().zone().resident_chunks().count()
    );
    Ok(())
}
