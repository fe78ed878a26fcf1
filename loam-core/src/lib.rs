//! # Loam core
//!
//! A voxel world engine: chunk columns in a cache, a single worker thread per
//! world that runs every mutation as a serial transaction, a fixed rate ticker
//! for scheduled, neighbour and random block updates, entities, weather and
//! persistence through pluggable providers.
//!
//! Start with [`WorldConfig`] to open a [`World`], then mutate it with
//! [`World::exec`] and observe it with a [`Loader`].
#![allow(clippy::module_name_repetitions)]

pub mod behavior;
pub mod block_entity;
pub mod chunk;
pub mod chunk_saver;
pub mod difficulty;
pub mod entity;
pub mod loader;
pub mod ticks;
pub mod world;

pub use chunk_saver::{DiskProvider, MemoryProvider, NopProvider, Provider, ProviderError};
pub use loader::{LoadArea, LoadManual, LoadRadius, LoadRegion, LoadStrategy, Loader, LoaderId};
pub use world::{SetOpts, Tx, World, WorldConfig, WorldError};
