//! This module contains the `ChunkSection` struct and its block palettes.

use std::mem;

use loam_registry::BlockRegistry;
use loam_utils::BlockStateId;
use smallvec::SmallVec;

/// The block states of one layer of a 16x16x16 section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockPalette {
    /// Every block in the layer is the same.
    Homogeneous(BlockStateId),
    /// One entry per block, indexed by [`BlockPalette::index`].
    Heterogeneous(Box<[BlockStateId]>),
}

impl BlockPalette {
    /// Edge length of a section.
    pub const SIZE: usize = 16;
    /// Number of blocks in a section.
    pub const VOLUME: usize = Self::SIZE * Self::SIZE * Self::SIZE;

    /// The flat index of a relative position.
    #[inline]
    #[must_use]
    pub const fn index(x: usize, y: usize, z: usize) -> usize {
        (y << 8) | (z << 4) | x
    }

    /// Gets the block at a relative position.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockStateId {
        match self {
            Self::Homogeneous(id) => *id,
            Self::Heterogeneous(blocks) => blocks[Self::index(x, y, z)],
        }
    }

    /// Sets the block at a relative position, returning the previous one.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: BlockStateId) -> BlockStateId {
        match self {
            Self::Homogeneous(id) if *id == value => value,
            Self::Homogeneous(id) => {
                let previous = *id;
                let mut blocks = vec![previous; Self::VOLUME].into_boxed_slice();
                blocks[Self::index(x, y, z)] = value;
                *self = Self::Heterogeneous(blocks);
                previous
            }
            Self::Heterogeneous(blocks) => {
                mem::replace(&mut blocks[Self::index(x, y, z)], value)
            }
        }
    }

    /// Whether every block in the layer is air.
    #[must_use]
    pub fn is_air(&self) -> bool {
        match self {
            Self::Homogeneous(id) => *id == BlockRegistry::AIR,
            Self::Heterogeneous(blocks) => blocks.iter().all(|b| *b == BlockRegistry::AIR),
        }
    }

    /// Collapses a heterogeneous layer that holds a single state.
    pub fn compact(&mut self) {
        if let Self::Heterogeneous(blocks) = self
            && let Some(first) = blocks.first().copied()
            && blocks.iter().all(|b| *b == first)
        {
            *self = Self::Homogeneous(first);
        }
    }
}

/// A 16 block tall slice of a chunk.
///
/// Layer 0 holds ordinary blocks, layer 1 holds liquids sharing a position
/// with a block. Further layers are allowed but unused by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    layers: SmallVec<[BlockPalette; 2]>,
}

impl ChunkSection {
    /// Creates a new empty chunk section.
    #[must_use]
    pub fn new_empty() -> Self {
        let mut layers = SmallVec::new();
        layers.push(BlockPalette::Homogeneous(BlockRegistry::AIR));
        Self { layers }
    }

    /// Creates a section from decoded layers. An empty list yields an empty section.
    #[must_use]
    pub fn from_layers(layers: Vec<BlockPalette>) -> Self {
        if layers.is_empty() {
            return Self::new_empty();
        }
        Self {
            layers: SmallVec::from_vec(layers),
        }
    }

    /// The layers of the section, layer 0 first.
    #[must_use]
    pub fn layers(&self) -> &[BlockPalette] {
        &self.layers
    }

    /// Gets a block on a layer. Missing layers read as air.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize, layer: usize) -> BlockStateId {
        self.layers
            .get(layer)
            .map_or(BlockRegistry::AIR, |l| l.get(x, y, z))
    }

    /// Sets a block on a layer, creating the layer if needed. Returns the previous block.
    pub fn set(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        value: BlockStateId,
    ) -> BlockStateId {
        if layer >= self.layers.len() {
            if value == BlockRegistry::AIR {
                return BlockRegistry::AIR;
            }
            self.layers
                .resize(layer + 1, BlockPalette::Homogeneous(BlockRegistry::AIR));
        }
        self.layers[layer].set(x, y, z, value)
    }

    /// Cheap check for a section whose block layer was never written to.
    #[inline]
    #[must_use]
    pub fn has_blocks(&self) -> bool {
        self.layers[0] != BlockPalette::Homogeneous(BlockRegistry::AIR)
    }

    /// Whether the section only holds air on every layer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(BlockPalette::is_air)
    }

    /// Compacts every layer and drops trailing all-air layers above layer 0.
    pub fn compact(&mut self) {
        for layer in &mut self.layers {
            layer.compact();
        }
        while self.layers.len() > 1
            && self
                .layers
                .last()
                .is_some_and(|l| *l == BlockPalette::Homogeneous(BlockRegistry::AIR))
        {
            self.layers.pop();
        }
    }
}

impl Default for ChunkSection {
    fn default() -> Self {
        Self::new_empty()
    }
}
