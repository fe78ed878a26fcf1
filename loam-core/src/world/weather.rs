//! Time, weather and other settings mutated from transactions.

use std::{ops::RangeInclusive, time::Duration};

use loam_utils::BlockPos;
use rand::Rng;
use uuid::Uuid;

use super::{Settings, Tx, tick};
use crate::difficulty::Difficulty;

/// Ticks of clear weather between two rain or thunder periods.
const CLEAR_TICKS: RangeInclusive<i64> = 12_000..=180_000;
/// Ticks a rain period lasts.
const RAIN_TICKS: RangeInclusive<i64> = 12_000..=24_000;
/// Ticks a thunder period lasts.
const THUNDER_TICKS: RangeInclusive<i64> = 3_600..=15_600;

fn rain_duration(raining: bool, rng: &mut impl Rng) -> i64 {
    rng.random_range(if raining { RAIN_TICKS } else { CLEAR_TICKS })
}

fn thunder_duration(thundering: bool, rng: &mut impl Rng) -> i64 {
    rng.random_range(if thundering { THUNDER_TICKS } else { CLEAR_TICKS })
}

/// Picks random durations for counters that ran out, as on a fresh world.
pub(crate) fn init_durations(settings: &mut Settings, rng: &mut impl Rng) {
    if settings.rain_time <= 0 {
        settings.rain_time = rain_duration(settings.raining, rng);
    }
    if settings.thunder_time <= 0 {
        settings.thunder_time = thunder_duration(settings.thundering, rng);
    }
}

/// Counts the weather down by one tick, flipping rain and thunder whose
/// counter ran out. Returns whether either flipped.
pub(crate) fn advance(settings: &mut Settings, rng: &mut impl Rng) -> bool {
    let mut changed = false;
    settings.rain_time -= 1;
    if settings.rain_time <= 0 {
        settings.raining = !settings.raining;
        settings.rain_time = rain_duration(settings.raining, rng);
        changed = true;
    }
    settings.thunder_time -= 1;
    if settings.thunder_time <= 0 {
        settings.thundering = !settings.thundering;
        settings.thunder_time = thunder_duration(settings.thundering, rng);
        changed = true;
    }
    changed
}

fn ticks(duration: Duration) -> i64 {
    i64::try_from(tick::ticks_of(duration)).unwrap_or(i64::MAX).max(1)
}

impl Tx<'_> {
    /// The current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Ticks run since the world was created.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.state.settings.current_tick
    }

    /// The time of day in ticks. It keeps counting past [`super::DAY_LENGTH`].
    #[must_use]
    pub fn time(&self) -> i64 {
        self.state.settings.time
    }

    /// Sets the time of day and pushes it to every viewer.
    pub fn set_time(&mut self, time: i64) {
        self.state.settings_mut().time = time;
        self.broadcast_time();
    }

    /// Stops the time of day from advancing.
    pub fn stop_time(&mut self) {
        self.state.settings_mut().time_cycle = false;
    }

    /// Lets the time of day advance again.
    pub fn start_time(&mut self) {
        self.state.settings_mut().time_cycle = true;
    }

    /// The world spawn.
    #[must_use]
    pub fn spawn(&self) -> BlockPos {
        self.state.settings.spawn
    }

    /// Moves the world spawn.
    pub fn set_spawn(&mut self, pos: BlockPos) {
        self.state.settings_mut().spawn = pos;
    }

    /// The difficulty.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.state.settings.difficulty
    }

    /// Changes the difficulty.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.state.settings_mut().difficulty = difficulty;
    }

    /// Changes the radius in chunks around loaders in which chunks are random ticked.
    pub fn set_tick_range(&mut self, range: i32) {
        self.state.settings_mut().tick_range = range.max(0);
    }

    /// Changes how many blocks per sub chunk are random ticked each tick.
    pub fn set_random_tick_speed(&mut self, speed: u32) {
        self.state.settings_mut().random_tick_speed = speed;
    }

    /// Whether it rains.
    #[must_use]
    pub fn raining(&self) -> bool {
        self.shared.dimension.has_weather() && self.state.settings.raining
    }

    /// Whether there is a thunderstorm. Thunder without rain doesn't count.
    #[must_use]
    pub fn thundering(&self) -> bool {
        self.raining() && self.state.settings.thundering
    }

    /// Starts rain lasting `duration`.
    pub fn start_raining(&mut self, duration: Duration) {
        let settings = self.state.settings_mut();
        settings.raining = true;
        settings.rain_time = ticks(duration);
        self.broadcast_weather();
    }

    /// Stops rain, and with it any thunderstorm.
    pub fn stop_raining(&mut self) {
        let state = &mut *self.state;
        state.settings_dirty = true;
        let settings = &mut state.settings;
        settings.raining = false;
        settings.rain_time = rain_duration(false, &mut state.rng);
        if settings.thundering {
            settings.thundering = false;
            settings.thunder_time = thunder_duration(false, &mut state.rng);
        }
        self.broadcast_weather();
    }

    /// Starts a thunderstorm lasting `duration`, raining at least as long.
    pub fn start_thundering(&mut self, duration: Duration) {
        let ticks = ticks(duration);
        let settings = self.state.settings_mut();
        settings.thundering = true;
        settings.thunder_time = ticks;
        if !settings.raining || settings.rain_time < ticks {
            settings.raining = true;
            settings.rain_time = ticks;
        }
        self.broadcast_weather();
    }

    /// Stops a thunderstorm. Rain continues.
    pub fn stop_thundering(&mut self) {
        let state = &mut *self.state;
        state.settings_dirty = true;
        state.settings.thundering = false;
        state.settings.thunder_time = thunder_duration(false, &mut state.rng);
        self.broadcast_weather();
    }

    /// Freezes the weather as it is.
    pub fn stop_weather_cycle(&mut self) {
        self.state.settings_mut().weather_cycle = false;
    }

    /// Lets the weather change again.
    pub fn start_weather_cycle(&mut self) {
        self.state.settings_mut().weather_cycle = true;
    }

    /// Where a player spawns: their own spawn if the provider has one, else the world spawn.
    pub fn player_spawn(&self, id: Uuid) -> BlockPos {
        match self.shared.provider.load_player_spawn(id) {
            Ok(Some(pos)) => pos,
            Ok(None) => self.state.settings.spawn,
            Err(err) => {
                log::warn!("Failed to load spawn of player {id}: {err}");
                self.state.settings.spawn
            }
        }
    }

    /// Stores a player's own spawn. Skipped in read only worlds.
    pub fn set_player_spawn(&self, id: Uuid, pos: BlockPos) {
        if self.shared.read_only {
            return;
        }
        if let Err(err) = self.shared.provider.save_player_spawn(id, pos) {
            log::warn!("Failed to save spawn of player {id}: {err}");
        }
    }

    pub(crate) fn broadcast_time(&self) {
        let time = self.state.settings.time;
        for loader in self.state.loaders.values() {
            loader.viewer.view_time(time);
        }
    }

    pub(crate) fn broadcast_weather(&self) {
        let (raining, thundering) = (self.raining(), self.thundering());
        for loader in self.state.loaders.values() {
            loader.viewer.view_weather(raining, thundering);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_rain_flips_when_counter_runs_out() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut settings = Settings {
            rain_time: 1,
            thunder_time: 100,
            ..Settings::default()
        };
        assert!(advance(&mut settings, &mut rng));
        assert!(settings.raining);
        assert!(RAIN_TICKS.contains(&settings.rain_time));
        assert_eq!(settings.thunder_time, 99);
        assert!(!settings.thundering);
    }

    #[test]
    fn test_thunder_duration_ranges() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut settings = Settings {
            rain_time: 500,
            thunder_time: 1,
            ..Settings::default()
        };
        assert!(advance(&mut settings, &mut rng));
        assert!(settings.thundering);
        assert!(THUNDER_TICKS.contains(&settings.thunder_time));
        assert!(!advance(&mut settings, &mut rng));
    }

    #[test]
    fn test_fresh_durations() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut settings = Settings::default();
        init_durations(&mut settings, &mut rng);
        assert!(CLEAR_TICKS.contains(&settings.rain_time));
        assert!(CLEAR_TICKS.contains(&settings.thunder_time));
    }
}
