//! Persisted form of a chunk column.
//!
//! Blocks are stored as a per layer palette of [`BlockState`]s plus one
//! palette index per block, so saved chunks survive runtime id changes
//! between registry versions.

use loam_registry::{BlockRegistry, BlockState};
use loam_utils::{BlockPos, BlockStateId, Identifier};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::chunk::{
    LevelChunk,
    section::{BlockPalette, ChunkSection},
};

/// One layer of a sub chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerData {
    /// Distinct states of the layer.
    pub palette: Vec<BlockState>,
    /// Palette index per block. Empty when the palette has a single entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<u16>,
}

/// One 16 block tall sub chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubChunkData {
    /// Layers, layer 0 first.
    pub layers: Vec<LayerData>,
}

/// A persisted block entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntityData {
    /// The absolute position of the block.
    pub pos: BlockPos,
    /// Whatever the block entity saved.
    pub data: serde_json::Value,
}

/// A persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    /// The entity type, used to pick a decoder.
    pub kind: Identifier,
    /// Whatever the entity saved.
    pub data: serde_json::Value,
}

/// Everything a provider stores for one chunk column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnData {
    /// Sub chunks, bottom first.
    pub sub_chunks: Vec<SubChunkData>,
    /// Block entities of the column.
    #[serde(default)]
    pub block_entities: Vec<BlockEntityData>,
    /// Entities inside the column.
    #[serde(default)]
    pub entities: Vec<EntityData>,
}

fn encode_layer(layer: &BlockPalette, blocks: &BlockRegistry) -> LayerData {
    match layer {
        BlockPalette::Homogeneous(id) => LayerData {
            palette: vec![blocks.state(*id).clone()],
            blocks: Vec::new(),
        },
        BlockPalette::Heterogeneous(ids) => {
            let mut palette = Vec::new();
            let mut lookup: FxHashMap<BlockStateId, u16> = FxHashMap::default();
            let indices: Vec<u16> = ids
                .iter()
                .map(|id| {
                    *lookup.entry(*id).or_insert_with(|| {
                        palette.push(blocks.state(*id).clone());
                        (palette.len() - 1) as u16
                    })
                })
                .collect();
            let blocks = if palette.len() == 1 { Vec::new() } else { indices };
            LayerData { palette, blocks }
        }
    }
}

/// Encodes the block storage of a chunk.
///
/// # Panics
/// Panics if the chunk holds a runtime id unknown to `blocks`.
#[must_use]
pub fn encode_chunk(chunk: &LevelChunk, blocks: &BlockRegistry) -> Vec<SubChunkData> {
    chunk
        .sections()
        .iter()
        .map(|section| {
            let mut layers: Vec<LayerData> = section
                .layers()
                .iter()
                .map(|layer| encode_layer(layer, blocks))
                .collect();
            while layers.len() > 1 && layers.last().is_some_and(|l| l.palette_is_air()) {
                layers.pop();
            }
            SubChunkData { layers }
        })
        .collect()
}

impl LayerData {
    fn palette_is_air(&self) -> bool {
        self.blocks.is_empty()
            && self.palette.len() == 1
            && self.palette[0].name == Identifier::vanilla_static("air")
    }
}

fn decode_layer(layer: &LayerData, blocks: &BlockRegistry) -> BlockPalette {
    let palette: Vec<BlockStateId> = layer
        .palette
        .iter()
        .map(|state| {
            blocks.id_of(state).unwrap_or_else(|| {
                log::warn!("Unknown block state {state} in saved chunk, replacing with air");
                BlockRegistry::AIR
            })
        })
        .collect();
    if layer.blocks.is_empty() {
        return BlockPalette::Homogeneous(palette.first().copied().unwrap_or(BlockRegistry::AIR));
    }
    let mut ids = vec![BlockRegistry::AIR; BlockPalette::VOLUME];
    for (slot, index) in ids.iter_mut().zip(&layer.blocks) {
        *slot = palette
            .get(usize::from(*index))
            .copied()
            .unwrap_or(BlockRegistry::AIR);
    }
    let mut layer = BlockPalette::Heterogeneous(ids.into_boxed_slice());
    layer.compact();
    layer
}

/// Decodes block storage for a chunk spanning `[min_y, max_y]`.
///
/// Unknown block states become air, sub chunks beyond the range are ignored.
#[must_use]
pub fn decode_chunk(
    sub_chunks: &[SubChunkData],
    min_y: i32,
    max_y: i32,
    blocks: &BlockRegistry,
) -> LevelChunk {
    let sections = sub_chunks
        .iter()
        .map(|sub| {
            ChunkSection::from_layers(
                sub.layers
                    .iter()
                    .map(|layer| decode_layer(layer, blocks))
                    .collect(),
            )
        })
        .collect();
    LevelChunk::from_sections(min_y, max_y, sections)
}
