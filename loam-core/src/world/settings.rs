//! Persisted scalar world state.

use loam_utils::BlockPos;
use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;

/// Ticks in one in-game day.
pub const DAY_LENGTH: i64 = 24_000;

/// World state that is not stored in chunks.
///
/// Inside a transaction it is read and written through [`Tx`](crate::world::Tx).
/// Outside, [`World::settings`](crate::world::World::settings) returns the
/// snapshot published after the last transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Display name of the world.
    pub name: String,
    /// World spawn.
    pub spawn: BlockPos,
    /// Time of day in ticks. Not wrapped at [`DAY_LENGTH`].
    pub time: i64,
    /// Whether time advances every tick.
    pub time_cycle: bool,
    /// Ticks until the rain state flips.
    pub rain_time: i64,
    /// Whether it is raining.
    pub raining: bool,
    /// Ticks until the thunder state flips.
    pub thunder_time: i64,
    /// Whether it is thundering. Only has an effect while raining.
    pub thundering: bool,
    /// Whether rain and thunder counters advance.
    pub weather_cycle: bool,
    /// Ticks simulated since the world was created.
    pub current_tick: u64,
    /// The world difficulty.
    pub difficulty: Difficulty,
    /// Radius in chunks around each loader in which chunks are randomly ticked.
    pub tick_range: i32,
    /// Random positions drawn per sub chunk per tick.
    pub random_tick_speed: u32,
}

impl Settings {
    /// Default simulation radius in chunks.
    pub const DEFAULT_TICK_RANGE: i32 = 6;
    /// Default random tick speed.
    pub const DEFAULT_RANDOM_TICK_SPEED: u32 = 3;
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "World".to_owned(),
            spawn: BlockPos::new(0, 64, 0),
            time: 0,
            time_cycle: true,
            rain_time: 0,
            raining: false,
            thunder_time: 0,
            thundering: false,
            weather_cycle: true,
            current_tick: 0,
            difficulty: Difficulty::Normal,
            tick_range: Self::DEFAULT_TICK_RANGE,
            random_tick_speed: Self::DEFAULT_RANDOM_TICK_SPEED,
        }
    }
}
