//! Block storage for one chunk column.

use loam_registry::BlockRegistry;
use loam_utils::{BlockStateId, SUB_CHUNK_SIZE};
use smallvec::SmallVec;

use crate::chunk::section::{BlockPalette, ChunkSection};

/// Full sky light.
pub const MAX_LIGHT: u8 = 15;

/// The block storage of a chunk: a stack of sections covering `[min_y, max_y]`.
///
/// Coordinates are relative on x and z (0..16) and absolute on y. Reads
/// outside the vertical range return air, writes outside it are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChunk {
    min_y: i32,
    max_y: i32,
    sections: Box<[ChunkSection]>,
}

impl LevelChunk {
    /// Creates an all-air chunk spanning `[min_y, max_y]`.
    #[must_use]
    pub fn new(min_y: i32, max_y: i32) -> Self {
        let count = Self::section_count(min_y, max_y);
        Self {
            min_y,
            max_y,
            sections: (0..count).map(|_| ChunkSection::new_empty()).collect(),
        }
    }

    /// Creates a chunk from decoded sections, padding or truncating to the range.
    #[must_use]
    pub fn from_sections(min_y: i32, max_y: i32, mut sections: Vec<ChunkSection>) -> Self {
        sections.resize_with(Self::section_count(min_y, max_y), ChunkSection::new_empty);
        Self {
            min_y,
            max_y,
            sections: sections.into_boxed_slice(),
        }
    }

    fn section_count(min_y: i32, max_y: i32) -> usize {
        usize::try_from((max_y - min_y + SUB_CHUNK_SIZE) / SUB_CHUNK_SIZE).unwrap_or(0)
    }

    /// The lowest block y.
    #[must_use]
    pub const fn min_y(&self) -> i32 {
        self.min_y
    }

    /// The highest block y.
    #[must_use]
    pub const fn max_y(&self) -> i32 {
        self.max_y
    }

    /// The sections, bottom first.
    #[must_use]
    pub fn sections(&self) -> &[ChunkSection] {
        &self.sections
    }

    /// The lowest y covered by the section at `index`.
    #[must_use]
    pub fn section_min_y(&self, index: usize) -> i32 {
        self.min_y + index as i32 * SUB_CHUNK_SIZE
    }

    fn locate(&self, y: i32) -> Option<(usize, usize)> {
        if y < self.min_y || y > self.max_y {
            return None;
        }
        let relative = usize::try_from(y - self.min_y).ok()?;
        Some((relative / BlockPalette::SIZE, relative % BlockPalette::SIZE))
    }

    /// Gets the block at a position on a layer.
    #[must_use]
    pub fn block(&self, x: usize, y: i32, z: usize, layer: usize) -> BlockStateId {
        debug_assert!(x < BlockPalette::SIZE && z < BlockPalette::SIZE);
        match self.locate(y) {
            Some((index, ry)) => self.sections[index].get(x, ry, z, layer),
            None => BlockRegistry::AIR,
        }
    }

    /// Sets the block at a position on a layer, returning the previous block.
    pub fn set_block(
        &mut self,
        x: usize,
        y: i32,
        z: usize,
        layer: usize,
        value: BlockStateId,
    ) -> BlockStateId {
        debug_assert!(x < BlockPalette::SIZE && z < BlockPalette::SIZE);
        match self.locate(y) {
            Some((index, ry)) => self.sections[index].set(x, ry, z, layer, value),
            None => BlockRegistry::AIR,
        }
    }

    /// The y of the highest non-air block on layer 0, or `min_y` if the column is empty.
    #[must_use]
    pub fn highest_block(&self, x: usize, z: usize) -> i32 {
        for (index, section) in self.sections.iter().enumerate().rev() {
            if section.layers()[0].is_air() {
                continue;
            }
            for ry in (0..BlockPalette::SIZE).rev() {
                if section.get(x, ry, z, 0) != BlockRegistry::AIR {
                    return self.section_min_y(index) + ry as i32;
                }
            }
        }
        self.min_y
    }

    /// Sky light reaching a position: full light minus what every block above filters out.
    #[must_use]
    pub fn sky_light(&self, x: usize, y: i32, z: usize, blocks: &BlockRegistry) -> u8 {
        if y > self.max_y {
            return MAX_LIGHT;
        }
        let floor = y.max(self.min_y - 1);
        let mut light = MAX_LIGHT;
        let mut current = self.max_y;
        while current > floor && light > 0 {
            match self.locate(current) {
                Some((index, _)) if self.sections[index].is_empty() => {
                    current = self.section_min_y(index) - 1;
                    continue;
                }
                Some(_) => {
                    for layer in 0..2 {
                        let id = self.block(x, current, z, layer);
                        light = light.saturating_sub(blocks.data(id).light_filter);
                    }
                }
                None => {}
            }
            current -= 1;
        }
        light
    }

    /// Block light at a position: emission of the block itself or of a direct
    /// neighbour within this chunk, one level dimmer.
    #[must_use]
    pub fn block_light(&self, x: usize, y: i32, z: usize, blocks: &BlockRegistry) -> u8 {
        let emission = |x: usize, y: i32, z: usize| {
            (0..2)
                .map(|layer| blocks.data(self.block(x, y, z, layer)).light_emission)
                .max()
                .unwrap_or(0)
        };
        let mut light = emission(x, y, z);
        let mut neighbours: SmallVec<[(usize, i32, usize); 6]> = SmallVec::new();
        if let Some(below) = y.checked_sub(1) {
            neighbours.push((x, below, z));
        }
        if let Some(above) = y.checked_add(1) {
            neighbours.push((x, above, z));
        }
        if x > 0 {
            neighbours.push((x - 1, y, z));
        }
        if x + 1 < BlockPalette::SIZE {
            neighbours.push((x + 1, y, z));
        }
        if z > 0 {
            neighbours.push((x, y, z - 1));
        }
        if z + 1 < BlockPalette::SIZE {
            neighbours.push((x, y, z + 1));
        }
        for (nx, ny, nz) in neighbours {
            light = light.max(emission(nx, ny, nz).saturating_sub(1));
        }
        light.min(MAX_LIGHT)
    }

    /// Compacts every section.
    pub fn compact(&mut self) {
        for section in &mut self.sections {
            section.compact();
        }
    }
}
