//! This module contains the `ChunkGenerator` trait, which is used to generate chunks.

use loam_utils::ChunkPos;

use crate::chunk::LevelChunk;

/// Fills chunks that the provider does not have.
///
/// Generation runs on the world's worker thread inside whatever transaction
/// first touched the chunk, so it should be cheap.
pub trait ChunkGenerator: Send + Sync {
    /// Populates a fresh all-air chunk.
    fn generate(&self, pos: ChunkPos, chunk: &mut LevelChunk);
}

/// A generator that leaves every chunk empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopChunkGenerator;

impl ChunkGenerator for NopChunkGenerator {
    fn generate(&self, _pos: ChunkPos, _chunk: &mut LevelChunk) {}
}
