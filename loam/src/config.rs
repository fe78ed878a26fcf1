//! Server configuration, read from a json5 file next to the binary.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use loam_core::world::Dimension;
use loam_utils::Identifier;
use serde::Deserialize;
use thiserror::Error;

/// Where the config is read from, relative to the working directory.
pub const CONFIG_PATH: &str = "config/loam_config.json5";

const DEFAULT_CONFIG: &str = include_str!("../../config/loam_config.json5");

/// The config loaded from [`CONFIG_PATH`] on first use.
///
/// # Panics
/// On first access, if the file can't be read, written or parsed, or holds invalid values.
pub static LOAM_CONFIG: LazyLock<LoamConfig> = LazyLock::new(|| {
    LoamConfig::load_or_create(Path::new(CONFIG_PATH))
        .unwrap_or_else(|e| panic!("failed to load {CONFIG_PATH}: {e}"))
});

/// Errors while loading the config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file couldn't be read or written.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The file isn't valid json5 for [`LoamConfig`].
    #[error("parse error: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("{0}")]
    Invalid(&'static str),
}

/// Settings of the server and the world it hosts.
#[derive(Debug, Clone, Deserialize)]
pub struct LoamConfig {
    /// Directory holding every world.
    pub world_dir: PathBuf,
    /// World directory inside `world_dir`, also the name of new worlds.
    pub world_name: String,
    /// Seed, random when missing.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Dimension of the world, fixing its height range.
    pub dimension: Dimension,
    /// Chunk radius around loaders that gets ticked.
    pub tick_range: i32,
    /// Random ticks per section per tick.
    pub random_tick_speed: u32,
    /// Seconds between janitor passes.
    pub janitor_interval: u64,
    /// Whether time advances.
    pub do_daylight_cycle: bool,
    /// Whether weather changes on its own.
    pub do_weather_cycle: bool,
    /// Never write to disk.
    pub read_only: bool,
    /// Chunk radius kept loaded around the world spawn.
    pub spawn_radius: i32,
    /// Blocks of the flat generator, bottom first.
    pub flat_layers: Vec<Identifier>,
    /// Default log filter, `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl LoamConfig {
    /// Reads the config at `path`, writing the default one there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Wrote default config to {}", path.display());
        }
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses and validates a config.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=32).contains(&self.tick_range) {
            return Err(ConfigError::Invalid("tick_range must be in range 1..=32"));
        }
        if self.random_tick_speed > 4096 {
            return Err(ConfigError::Invalid("random_tick_speed must be at most 4096"));
        }
        if self.janitor_interval < 1 {
            return Err(ConfigError::Invalid("janitor_interval must be at least 1 second"));
        }
        if !(0..=32).contains(&self.spawn_radius) {
            return Err(ConfigError::Invalid("spawn_radius must be in range 0..=32"));
        }
        if self.world_name.is_empty() {
            return Err(ConfigError::Invalid("world_name can't be empty"));
        }
        Ok(())
    }
}
