//! # Loam
//!
//! Hosts a single loam world: reads the config, opens the world on disk,
//! keeps the spawn area loaded and closes everything on shutdown.
#![allow(clippy::module_name_repetitions)]

use std::{sync::Arc, time::Duration};

use loam_core::{
    DiskProvider, LoadRadius, Loader, ProviderError, World, WorldConfig, WorldError,
    chunk::FlatChunkGenerator, world::NopViewer,
};
use loam_registry::{Registry, RegistryExt};
use loam_utils::{Identifier, math::Vector3};
use thiserror::Error;
use tokio::{select, task, time};
use tokio_util::sync::CancellationToken;

use crate::config::LoamConfig;

pub mod config;
pub mod logging;

/// Chunks of the spawn area loaded per tick while it is being prepared.
const SPAWN_CHUNKS_PER_TICK: usize = 8;

/// Errors while starting or stopping the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The world directory couldn't be opened.
    #[error("failed to open world storage: {0}")]
    Provider(#[from] ProviderError),
    /// The world failed or closed early.
    #[error(transparent)]
    World(#[from] WorldError),
    /// A flat layer names a block that isn't registered.
    #[error("unknown block {0} in flat_layers")]
    UnknownBlock(Identifier),
}

/// The main server struct.
pub struct LoamServer {
    /// The cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    /// The hosted world.
    pub world: Arc<World>,
    spawn_loader: Loader,
}

impl LoamServer {
    /// Opens the configured world and starts loading its spawn area.
    pub fn new(config: &LoamConfig) -> Result<Self, ServerError> {
        log::info!("Starting Loam server");

        let mut registry = Registry::with_vanilla();
        registry.freeze();
        let layers = config
            .flat_layers
            .iter()
            .map(|name| {
                registry
                    .blocks
                    .default_state(name)
                    .ok_or_else(|| ServerError::UnknownBlock(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let provider = DiskProvider::open(config.world_dir.join(&config.world_name))?;
        let mut world_config = WorldConfig {
            provider: Arc::new(provider),
            generator: Arc::new(FlatChunkGenerator::with_layers(layers)),
            dimension: config.dimension,
            name: config.world_name.clone(),
            read_only: config.read_only,
            janitor_interval: Duration::from_secs(config.janitor_interval),
            ..WorldConfig::new(Arc::new(registry))
        };
        if let Some(seed) = config.seed {
            world_config.seed = seed;
        }
        let world = world_config.build()?;

        let (tick_range, random_tick_speed) = (config.tick_range, config.random_tick_speed);
        let (daylight, weather) = (config.do_daylight_cycle, config.do_weather_cycle);
        world.exec(move |tx| {
            tx.set_tick_range(tick_range);
            tx.set_random_tick_speed(random_tick_speed);
            if daylight {
                tx.start_time();
            } else {
                tx.stop_time();
            }
            if weather {
                tx.start_weather_cycle();
            } else {
                tx.stop_weather_cycle();
            }
        })?;

        let spawn = world.settings().spawn;
        let center = Vector3::new(
            f64::from(spawn.x()) + 0.5,
            f64::from(spawn.y()),
            f64::from(spawn.z()) + 0.5,
        );
        let spawn_loader = Loader::new(
            &world,
            center,
            LoadRadius::new(config.spawn_radius),
            Arc::new(NopViewer),
        );
        log::info!(
            "Opened world {} ({}) with spawn at {spawn:?}",
            world.name(),
            world.dimension().name()
        );

        Ok(Self {
            cancel_token: CancellationToken::new(),
            world,
            spawn_loader,
        })
    }

    /// Prepares the spawn area and keeps the world running until
    /// [`LoamServer::stop`] is called, then closes it.
    pub async fn run(self) -> Result<(), ServerError> {
        log::info!("Started Loam server");
        let mut interval = time::interval(WorldConfig::DEFAULT_TICK_INTERVAL);
        let mut spawn_ready = false;
        loop {
            select! {
                () = self.cancel_token.cancelled() => {
                    break;
                }
                _ = interval.tick(), if !spawn_ready => {
                    let loader = &self.spawn_loader;
                    let (loaded, remaining) = task::block_in_place(|| -> Result<_, WorldError> {
                        loader.load(SPAWN_CHUNKS_PER_TICK)?;
                        Ok((loader.loaded().len(), loader.queued().len()))
                    })?;
                    if remaining == 0 {
                        log::info!("Spawn area ready, {loaded} chunks loaded");
                        spawn_ready = true;
                    } else {
                        log::debug!("Preparing spawn area: {loaded}/{}", loaded + remaining);
                    }
                }
            }
        }

        log::info!("Stopping Loam server");
        task::block_in_place(|| {
            self.spawn_loader.close()?;
            self.world.close()
        })?;
        log::info!("World {} saved", self.world.name());
        Ok(())
    }

    /// Stops the server.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
