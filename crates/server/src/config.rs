//! Server configuration, loaded from YAML.

use std::{fs, path::Path};

use anyhow::Context;
use glam::{vec3, Vec3};
use physics::PhysicsSettings;
use serde::Deserialize;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("tps must be at least 1")]
    ZeroTps,
    #[error("physics.substeps must be at least 1")]
    ZeroSubsteps,
    #[error("player.mass must be positive, got {0}")]
    NonPositiveMass(f32),
    #[error("player.reach must be finite and not negative, got {0}")]
    InvalidReach(f32),
}

/// Top-level server configuration. Every field has a default,
/// so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ticks per second.
    pub tps: u32,
    /// Radius of each player's chunk window, in chunks.
    pub load_radius: u32,
    pub physics: PhysicsSettings,
    pub world: WorldConfig,
    pub player: PlayerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tps: 20,
            load_radius: 1,
            physics: PhysicsSettings::default(),
            world: WorldConfig::default(),
            player: PlayerSettings::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Half-size of the world on each axis; positions are clamped to it.
    pub extents: Vec3,
    pub spawn: Vec3,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            extents: vec3(1024., 256., 1024.),
            spawn: vec3(0.5, 65., 0.5),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub mass: f32,
    pub drag: f32,
    /// Target horizontal speed, in blocks per second.
    pub walk_speed: f32,
    /// Largest horizontal force applied to reach the walk speed.
    pub max_force: f32,
    pub jump_impulse: f32,
    /// How far away a player can target blocks.
    pub reach: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            mass: 1.,
            drag: 0.18,
            walk_speed: 4.3,
            max_force: 20.,
            jump_impulse: 5.,
            reach: 6.,
        }
    }
}

impl Config {
    /// Reads and validates the configuration at `path`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config '{}'", path.display()))
    }

    /// Parses and validates a configuration from YAML text.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        // serde_yaml rejects an empty document; treat it as all defaults.
        let config: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tps == 0 {
            return Err(ConfigError::ZeroTps);
        }
        if self.physics.substeps == 0 {
            return Err(ConfigError::ZeroSubsteps);
        }
        if !(self.player.mass > 0.) {
            return Err(ConfigError::NonPositiveMass(self.player.mass));
        }
        if !(self.player.reach.is_finite() && self.player.reach >= 0.) {
            return Err(ConfigError::InvalidReach(self.player.reach));
        }
        Ok(())
    }

    /// Length of a tick in seconds.
    pub fn tick_length(&self) -> f32 {
        1. / self.tps as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_yaml(
            "tps: 10\nphysics:\n  substeps: 4\nworld:\n  spawn: [1.0, 2.0, 3.0]\nplayer:\n  walk_speed: 6.0\n",
        )
        .unwrap();
        assert_eq!(config.tps, 10);
        assert_eq!(config.physics.substeps, 4);
        assert_eq!(config.physics.gravity, physics::GRAVITY);
        assert_eq!(config.world.spawn, vec3(1., 2., 3.));
        assert_eq!(config.world.extents, WorldConfig::default().extents);
        assert_eq!(config.player.walk_speed, 6.);
        assert_eq!(config.player.mass, 1.);
        assert_eq!(config.tick_length(), 0.1);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = Config::default();
        config.tps = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTps));

        let mut config = Config::default();
        config.physics.substeps = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSubsteps));

        let mut config = Config::default();
        config.player.mass = 0.;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveMass(0.)));

        assert!(Config::from_yaml("player:\n  mass: -1.0\n").is_err());

        let mut config = Config::default();
        config.player.reach = f32::INFINITY;
        assert_eq!(config.validate(), Err(ConfigError::InvalidReach(f32::INFINITY)));
        config.player.reach = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidReach(_))));
        assert!(Config::from_yaml("player:\n  reach: .inf\n").is_err());
    }

    #[test]
    fn malformed_yaml_fails() {
        assert!(Config::from_yaml("tps: [1, 2").is_err());
    }
}
