//! Chunk and world persistence.
//!
//! A [`Provider`] stores columns, world settings and player spawns. The world
//! writes evicted columns through a [`SaveQueue`] so the worker never waits on
//! storage; columns still queued are served from the queue on reload.

mod disk;
mod nop;
mod ram_only;
mod save_queue;

pub use disk::DiskProvider;
pub use nop::NopProvider;
pub use ram_only::MemoryProvider;
pub(crate) use save_queue::SaveQueue;

use std::io;

use loam_utils::{BlockPos, ChunkPos};
use thiserror::Error;
use uuid::Uuid;

use crate::chunk::ColumnData;
use crate::world::{Dimension, Settings};

/// Errors reported by a [`Provider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The underlying storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Stored data could not be encoded or decoded.
    #[error("malformed data: {0}")]
    Codec(#[from] serde_json::Error),
    /// The provider was closed.
    #[error("provider is closed")]
    Closed,
}

/// Persistence backend of a world.
///
/// Calls come from the world's worker thread (loads, settings) and from its
/// saver thread (column stores), so implementations synchronise internally.
pub trait Provider: Send + Sync {
    /// Loads the world settings. `Ok(None)` means the world is new.
    fn settings(&self) -> Result<Option<Settings>, ProviderError>;

    /// Stores the world settings.
    fn save_settings(&self, settings: &Settings) -> Result<(), ProviderError>;

    /// Loads a column. `Ok(None)` means it was never stored.
    fn load_column(
        &self,
        pos: ChunkPos,
        dimension: Dimension,
    ) -> Result<Option<ColumnData>, ProviderError>;

    /// Stores a column, replacing what was stored before.
    fn store_column(
        &self,
        pos: ChunkPos,
        dimension: Dimension,
        data: &ColumnData,
    ) -> Result<(), ProviderError>;

    /// Loads the spawn position of a player. `Ok(None)` means the player has no own spawn.
    fn load_player_spawn(&self, id: Uuid) -> Result<Option<BlockPos>, ProviderError>;

    /// Stores the spawn position of a player.
    fn save_player_spawn(&self, id: Uuid, pos: BlockPos) -> Result<(), ProviderError>;

    /// Releases resources. Called once when the world closes, after every save.
    fn close(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
