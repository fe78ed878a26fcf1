//! RAM-only persistence.
//!
//! Keeps everything in memory for the lifetime of the provider. Useful for
//! tests and minigame worlds that should survive chunk eviction but not a
//! restart.

use loam_utils::{BlockPos, ChunkPos, locks::SyncMutex};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use super::{Provider, ProviderError};
use crate::chunk::ColumnData;
use crate::world::{Dimension, Settings};

/// In-memory provider.
#[derive(Default)]
pub struct MemoryProvider {
    settings: SyncMutex<Option<Settings>>,
    columns: SyncMutex<FxHashMap<(Dimension, ChunkPos), ColumnData>>,
    player_spawns: SyncMutex<FxHashMap<Uuid, BlockPos>>,
}

impl MemoryProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a column has been stored.
    #[must_use]
    pub fn has_column(&self, pos: ChunkPos, dimension: Dimension) -> bool {
        self.columns.lock().contains_key(&(dimension, pos))
    }

    /// Number of stored columns across all dimensions.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.lock().len()
    }
}

impl Provider for MemoryProvider {
    fn settings(&self) -> Result<Option<Settings>, ProviderError> {
        Ok(self.settings.lock().clone())
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), ProviderError> {
        *self.settings.lock() = Some(settings.clone());
        Ok(())
    }

    fn load_column(
        &self,
        pos: ChunkPos,
        dimension: Dimension,
    ) -> Result<Option<ColumnData>, ProviderError> {
        Ok(self.columns.lock().get(&(dimension, pos)).cloned())
    }

    fn store_column(
        &self,
        pos: ChunkPos,
        dimension: Dimension,
        data: &ColumnData,
    ) -> Result<(), ProviderError> {
        self.columns.lock().insert((dimension, pos), data.clone());
        Ok(())
    }

    fn load_player_spawn(&self, id: Uuid) -> Result<Option<BlockPos>, ProviderError> {
        Ok(self.player_spawns.lock().get(&id).copied())
    }

    fn save_player_spawn(&self, id: Uuid, pos: BlockPos) -> Result<(), ProviderError> {
        self.player_spawns.lock().insert(id, pos);
        Ok(())
    }
}
