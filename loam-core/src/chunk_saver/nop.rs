use loam_utils::{BlockPos, ChunkPos};
use uuid::Uuid;

use super::{Provider, ProviderError};
use crate::chunk::ColumnData;
use crate::world::{Dimension, Settings};

/// A provider that stores nothing. Every chunk is generated fresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopProvider;

impl Provider for NopProvider {
    fn settings(&self) -> Result<Option<Settings>, ProviderError> {
        Ok(None)
    }

    fn save_settings(&self, _settings: &Settings) -> Result<(), ProviderError> {
        Ok(())
    }

    fn load_column(
        &self,
        _pos: ChunkPos,
        _dimension: Dimension,
    ) -> Result<Option<ColumnData>, ProviderError> {
        Ok(None)
    }

    fn store_column(
        &self,
        _pos: ChunkPos,
        _dimension: Dimension,
        _data: &ColumnData,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    fn load_player_spawn(&self, _id: Uuid) -> Result<Option<BlockPos>, ProviderError> {
        Ok(None)
    }

    fn save_player_spawn(&self, _id: Uuid, _pos: BlockPos) -> Result<(), ProviderError> {
        Ok(())
    }
}
