//! This module contains the `World` struct and everything that runs on its worker thread.
//!
//! A world owns its state on one dedicated thread. Everything else talks to it
//! by submitting transactions: callbacks that receive a [`Tx`] and run one at a
//! time, in submission order. The [`Tx`] only lives as long as the callback, so
//! it can't be smuggled out of one:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use loam_core::world::WorldConfig;
//! # use loam_registry::Registry;
//! let world = WorldConfig::new(Arc::new(Registry::with_vanilla())).build().unwrap();
//! let tx = world.exec(|tx| tx);
//! ```

mod dimension;
mod driver;
mod effects;
mod handler;
mod queue;
mod settings;
mod state;
mod tick;
mod tx;
mod viewer;
mod weather;

pub use dimension::Dimension;
pub use effects::MAX_EXPLOSION_RADIUS;
pub use handler::{Context, Explosion, Handler, NopHandler};
pub use queue::{Pending, Validity};
pub use settings::{DAY_LENGTH, Settings};
pub use tx::{SetOpts, Tx};
pub use viewer::{NopViewer, Particle, Sound, Viewer};

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use arc_swap::ArcSwap;
use loam_registry::Registry;
use loam_utils::locks::SyncMutex;
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;

use crate::behavior::BlockBehaviours;
use crate::chunk::{ChunkGenerator, NopChunkGenerator};
use crate::chunk_saver::{NopProvider, Provider, SaveQueue};
use crate::entity::EntityTypes;
use driver::Driver;
pub(crate) use queue::Submitter;
use state::WorldState;

/// Errors returned by world operations.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The world closed before the transaction ran.
    #[error("world is closed")]
    Closed,
    /// A world thread could not be started.
    #[error("failed to start world thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Everything needed to open a [`World`].
pub struct WorldConfig {
    /// Block and item registries. Should be frozen.
    pub registry: Arc<Registry>,
    /// Behaviour of block states.
    pub behaviours: Arc<BlockBehaviours>,
    /// Decoders for persisted entities.
    pub entity_types: Arc<EntityTypes>,
    /// Where columns and settings are stored.
    pub provider: Arc<dyn Provider>,
    /// Fills columns that the provider doesn't have.
    pub generator: Arc<dyn ChunkGenerator>,
    /// Initial event handler, replaceable with [`World::handle`].
    pub handler: Arc<dyn Handler>,
    /// The dimension, fixing height range and weather.
    pub dimension: Dimension,
    /// Name used for new worlds and thread names. Stored settings keep their own name.
    pub name: String,
    /// Skip every write to the provider.
    pub read_only: bool,
    /// Seed of the world's random source.
    pub seed: u64,
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Time between janitor passes evicting unviewed columns.
    pub janitor_interval: Duration,
    /// Whether a driver thread ticks the world. Without it, call [`World::tick_now`].
    pub autotick: bool,
}

impl WorldConfig {
    /// Default time between ticks, 20 ticks per second.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);
    /// Default time between janitor passes.
    pub const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// A config for an empty, unsaved overworld.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            behaviours: Arc::new(BlockBehaviours::new()),
            entity_types: Arc::new(EntityTypes::new()),
            provider: Arc::new(NopProvider),
            generator: Arc::new(NopChunkGenerator),
            handler: Arc::new(NopHandler),
            dimension: Dimension::Overworld,
            name: "World".to_owned(),
            read_only: false,
            seed: rand::random(),
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            janitor_interval: Self::DEFAULT_JANITOR_INTERVAL,
            autotick: true,
        }
    }

    /// Opens the world and starts its threads.
    pub fn build(self) -> Result<Arc<World>, WorldError> {
        World::open(self)
    }
}

/// Read only parts of a world, shared by its threads.
pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) registry: Arc<Registry>,
    pub(crate) behaviours: Arc<BlockBehaviours>,
    pub(crate) entity_types: Arc<EntityTypes>,
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) generator: Arc<dyn ChunkGenerator>,
    pub(crate) dimension: Dimension,
    pub(crate) read_only: bool,
    pub(crate) saver: SaveQueue,
    pub(crate) settings: ArcSwap<Settings>,
}

/// A struct that represents a world.
///
/// All state lives on the world's worker thread and is reached through
/// transactions. Closing happens on [`World::close`] or on drop.
pub struct World {
    shared: Arc<Shared>,
    submitter: Submitter,
    worker: SyncMutex<Option<JoinHandle<()>>>,
    driver: SyncMutex<Option<Driver>>,
    closed: AtomicBool,
}

impl World {
    fn open(config: WorldConfig) -> Result<Arc<Self>, WorldError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut settings = match config.provider.settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings {
                name: config.name.clone(),
                ..Settings::default()
            },
            Err(err) => {
                log::warn!("Failed to load settings of world {}: {err}", config.name);
                Settings {
                    name: config.name.clone(),
                    ..Settings::default()
                }
            }
        };
        weather::init_durations(&mut settings, &mut rng);

        let name = settings.name.clone();
        let saver = SaveQueue::spawn(Arc::clone(&config.provider), config.dimension, &name)?;
        let shared = Arc::new(Shared {
            name: name.clone(),
            registry: config.registry,
            behaviours: config.behaviours,
            entity_types: config.entity_types,
            provider: config.provider,
            generator: config.generator,
            dimension: config.dimension,
            read_only: config.read_only,
            saver,
            settings: ArcSwap::from_pointee(settings.clone()),
        });
        let state = WorldState::new(settings, rng, config.handler);
        let (submitter, worker) = queue::spawn_worker(Arc::clone(&shared), state)?;
        let driver = if config.autotick {
            Some(Driver::spawn(
                submitter.clone(),
                &name,
                config.tick_interval,
                config.janitor_interval,
            )?)
        } else {
            None
        };

        log::info!(
            "Opened world {name} ({}){}",
            config.dimension.name(),
            if config.read_only { ", read only" } else { "" }
        );
        Ok(Arc::new(Self {
            shared,
            submitter,
            worker: SyncMutex::new(Some(worker)),
            driver: SyncMutex::new(driver),
            closed: AtomicBool::new(false),
        }))
    }

    /// Runs a transaction and waits for its result.
    ///
    /// # Panics
    /// Panics if called from inside a transaction of this world.
    pub fn exec<F, R>(&self, callback: F) -> Result<R, WorldError>
    where
        F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(callback).wait()
    }

    /// Queues a transaction without waiting for it.
    pub fn submit<F, R>(&self, callback: F) -> Pending<R>
    where
        F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submitter.submit(callback)
    }

    /// Runs a transaction and awaits its result.
    pub async fn exec_async<F, R>(&self, callback: F) -> Result<R, WorldError>
    where
        F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(callback).await
    }

    /// Queues a transaction that is skipped if `validity` is invalidated
    /// before the worker reaches it. Skipped transactions resolve to `None`.
    pub fn submit_weak<F, R>(&self, validity: &Validity, callback: F) -> Pending<Option<R>>
    where
        F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submitter.submit_weak(validity, callback)
    }

    /// Runs a weak transaction and waits for it. `Ok(None)` means it was skipped.
    ///
    /// # Panics
    /// Panics if called from inside a transaction of this world.
    pub fn exec_weak<F, R>(&self, validity: &Validity, callback: F) -> Result<Option<R>, WorldError>
    where
        F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_weak(validity, callback).wait()
    }

    /// The settings as of the end of the last transaction.
    #[must_use]
    pub fn settings(&self) -> Arc<Settings> {
        self.shared.settings.load_full()
    }

    /// The world's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The world's dimension.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.shared.dimension
    }

    /// The lowest and highest block y, inclusive.
    #[must_use]
    pub fn range(&self) -> (i32, i32) {
        self.shared.dimension.range()
    }

    /// The registries the world was opened with.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.shared.registry
    }

    /// Whether the world was opened read only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.shared.read_only
    }

    /// Replaces the event handler.
    pub fn handle(&self, handler: impl Handler + 'static) -> Result<(), WorldError> {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        self.exec(move |tx| tx.state.handler = handler)
    }

    /// Runs one tick right away, independent of the driver.
    pub fn tick_now(&self) -> Result<(), WorldError> {
        self.exec(tick::tick)
    }

    /// Evicts every column without viewers. Returns how many were evicted.
    pub fn collect_garbage(&self) -> Result<usize, WorldError> {
        self.exec(|tx| tx.state.collect_garbage(tx.shared))
    }

    /// Saves every loaded column and the settings, keeping everything loaded.
    /// Returns the number of columns written.
    pub fn save(&self) -> Result<usize, WorldError> {
        self.exec(|tx| {
            let saved = tx.state.save_all(tx.shared);
            tx.state.save_settings(tx.shared);
            saved
        })
    }

    /// Whether [`World::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops ticking, finishes queued transactions and saves everything.
    ///
    /// Transactions submitted afterwards resolve to [`WorldError::Closed`].
    /// Closing from inside a transaction of this world only queues the close.
    pub fn close(&self) -> Result<(), WorldError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        log::info!("Closing world {}", self.shared.name);
        let in_worker = self.submitter.is_worker();
        if let Some(driver) = self.driver.lock().take() {
            if in_worker {
                driver.signal_stop();
            } else {
                driver.stop();
            }
        }
        let done = self.submitter.close();
        if in_worker {
            return Ok(());
        }
        let result = done.wait();
        if let Some(worker) = self.worker.lock().take()
            && worker.join().is_err()
        {
            log::error!("Worker of world {} panicked", self.shared.name);
        }
        result
    }
}

impl Drop for World {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("Failed to close world {}: {err}", self.shared.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn world() -> Arc<World> {
        let config = WorldConfig {
            autotick: false,
            seed: 7,
            ..WorldConfig::new(Arc::new(Registry::with_vanilla()))
        };
        config.build().expect("world opens")
    }

    #[test]
    fn test_exec_returns_value() {
        let world = world();
        assert_eq!(world.exec(|tx| tx.range()).expect("open"), (-64, 319));
    }

    #[test]
    fn test_closed_world_rejects_transactions() {
        let world = world();
        world.close().expect("closes");
        assert!(world.is_closed());
        assert!(matches!(world.exec(|_| ()), Err(WorldError::Closed)));
        world.close().expect("closing twice is fine");
    }

    #[test]
    fn test_settings_snapshot_published() {
        let world = world();
        world.exec(|tx| tx.set_time(1_000)).expect("open");
        assert_eq!(world.settings().time, 1_000);
    }

    #[test]
    fn test_waiting_inside_transaction_panics() {
        let world = world();
        let inner = Arc::clone(&world);
        let panicked = world
            .exec(move |_| catch_unwind(AssertUnwindSafe(|| inner.exec(|_| ()))).is_err())
            .expect("open");
        assert!(panicked);
    }
}
