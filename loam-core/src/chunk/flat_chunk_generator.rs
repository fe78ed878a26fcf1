//! A generator filling every column with the same stack of layers.

use loam_registry::{BlockRegistry, vanilla};
use loam_utils::{BlockStateId, ChunkPos};

use crate::chunk::{LevelChunk, chunk_generator::ChunkGenerator, section::BlockPalette};

/// A chunk generator that generates a flat world.
#[derive(Debug, Clone)]
pub struct FlatChunkGenerator {
    /// The layers placed from the bottom of the world upwards.
    pub layers: Vec<BlockStateId>,
}

impl FlatChunkGenerator {
    /// Creates the classic flat world: bedrock, two dirt, one grass.
    #[must_use]
    pub fn new(bedrock: BlockStateId, dirt: BlockStateId, grass: BlockStateId) -> Self {
        Self::with_layers(vec![bedrock, dirt, dirt, grass])
    }

    /// Creates a generator with explicit layers, bottom first.
    #[must_use]
    pub fn with_layers(layers: Vec<BlockStateId>) -> Self {
        Self { layers }
    }

    /// The classic flat world using the vanilla blocks of a registry, if they are registered.
    #[must_use]
    pub fn vanilla(blocks: &BlockRegistry) -> Option<Self> {
        Some(Self::new(
            blocks.default_state(&vanilla::BEDROCK)?,
            blocks.default_state(&vanilla::DIRT)?,
            blocks.default_state(&vanilla::GRASS_BLOCK)?,
        ))
    }
}

impl ChunkGenerator for FlatChunkGenerator {
    fn generate(&self, _pos: ChunkPos, chunk: &mut LevelChunk) {
        let min_y = chunk.min_y();
        for (offset, block) in self.layers.iter().enumerate() {
            let y = min_y + offset as i32;
            for x in 0..BlockPalette::SIZE {
                for z in 0..BlockPalette::SIZE {
                    chunk.set_block(x, y, z, 0, *block);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_layers_from_bottom() {
        let mut blocks = BlockRegistry::new();
        vanilla::register_blocks(&mut blocks);
        let generator = FlatChunkGenerator::vanilla(&blocks).expect("vanilla blocks");
        let mut chunk = LevelChunk::new(-64, 319);
        generator.generate(ChunkPos::new(3, -2), &mut chunk);

        assert_eq!(chunk.block(7, -64, 7, 0), generator.layers[0]);
        assert_eq!(chunk.block(0, -61, 15, 0), generator.layers[3]);
        assert_eq!(chunk.block(0, -60, 0, 0), BlockRegistry::AIR);
        assert_eq!(chunk.highest_block(4, 4), -61);
    }
}
