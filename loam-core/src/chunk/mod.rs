//! Chunk storage, generation and the column cache.

pub(crate) mod cache;
pub mod chunk_generator;
pub mod codec;
pub(crate) mod column;
pub mod flat_chunk_generator;
pub mod level_chunk;
pub mod section;

pub use chunk_generator::{ChunkGenerator, NopChunkGenerator};
pub use codec::{BlockEntityData, ColumnData, EntityData, LayerData, SubChunkData};
pub(crate) use column::Column;
pub use flat_chunk_generator::FlatChunkGenerator;
pub use level_chunk::LevelChunk;
