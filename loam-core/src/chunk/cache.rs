//! The map from chunk position to loaded column.

use std::cell::Cell;

use loam_utils::ChunkPos;
use rustc_hash::FxHashMap;

use crate::chunk::Column;

/// Dense storage of loaded columns with a position index.
///
/// Lookups of the same position in a row skip the hash map through a one
/// entry cache, which is the common pattern while editing blocks in one chunk.
pub(crate) struct ChunkCache {
    columns: Vec<Column>,
    /// `positions[i]` is the position of `columns[i]`.
    positions: Vec<ChunkPos>,
    index: FxHashMap<ChunkPos, usize>,
    last: Cell<Option<(ChunkPos, usize)>>,
}

impl ChunkCache {
    pub(crate) fn new() -> Self {
        Self {
            columns: Vec::new(),
            positions: Vec::new(),
            index: FxHashMap::default(),
            last: Cell::new(None),
        }
    }

    fn slot_of(&self, pos: ChunkPos) -> Option<usize> {
        if let Some((last_pos, slot)) = self.last.get()
            && last_pos == pos
        {
            return Some(slot);
        }
        let slot = *self.index.get(&pos)?;
        self.last.set(Some((pos, slot)));
        Some(slot)
    }

    pub(crate) fn contains(&self, pos: ChunkPos) -> bool {
        self.slot_of(pos).is_some()
    }

    pub(crate) fn get(&self, pos: ChunkPos) -> Option<&Column> {
        self.slot_of(pos).map(|slot| &self.columns[slot])
    }

    pub(crate) fn get_mut(&mut self, pos: ChunkPos) -> Option<&mut Column> {
        self.slot_of(pos).map(|slot| &mut self.columns[slot])
    }

    /// Returns the cached column, creating it with `load` if it is missing.
    pub(crate) fn get_or_insert_with(
        &mut self,
        pos: ChunkPos,
        load: impl FnOnce() -> Column,
    ) -> &mut Column {
        match self.slot_of(pos) {
            Some(slot) => &mut self.columns[slot],
            None => self.insert(pos, load()),
        }
    }

    /// Inserts a column that is not cached yet.
    pub(crate) fn insert(&mut self, pos: ChunkPos, column: Column) -> &mut Column {
        debug_assert!(!self.index.contains_key(&pos), "column {pos} cached twice");
        let slot = self.columns.len();
        self.columns.push(column);
        self.positions.push(pos);
        self.index.insert(pos, slot);
        self.last.set(Some((pos, slot)));
        &mut self.columns[slot]
    }

    pub(crate) fn remove(&mut self, pos: ChunkPos) -> Option<Column> {
        let slot = self.index.remove(&pos)?;
        self.last.set(None);
        let column = self.columns.swap_remove(slot);
        self.positions.swap_remove(slot);
        if let Some(moved) = self.positions.get(slot) {
            self.index.insert(*moved, slot);
        }
        Some(column)
    }

    pub(crate) fn positions(&self) -> &[ChunkPos] {
        &self.positions
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ChunkPos, &Column)> {
        self.positions.iter().copied().zip(&self.columns)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (ChunkPos, &mut Column)> {
        self.positions.iter().copied().zip(&mut self.columns)
    }

    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::LevelChunk;

    fn column() -> Column {
        Column::new(LevelChunk::new(0, 15))
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut cache = ChunkCache::new();
        let a = ChunkPos::new(0, 0);
        let b = ChunkPos::new(5, -3);
        let c = ChunkPos::new(-2, 8);
        cache.insert(a, column());
        cache.insert(b, column());
        cache.insert(c, column()).modified = true;

        assert!(cache.remove(a).is_some());
        assert!(!cache.contains(a));
        assert!(cache.remove(a).is_none());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(c).is_some_and(|col| col.modified));
        assert!(cache.get(b).is_some_and(|col| !col.modified));
        assert_eq!(cache.iter().count(), 2);
    }

    #[test]
    fn test_get_or_insert_loads_once() {
        let mut cache = ChunkCache::new();
        let a = ChunkPos::new(1, 1);
        let mut loads = 0;
        for _ in 0..3 {
            cache.get_or_insert_with(a, || {
                loads += 1;
                column()
            });
        }
        assert_eq!(loads, 1);
        assert_eq!(cache.last.get().map(|(p, _)| p), Some(a));
        cache.remove(a);
        assert_eq!(cache.last.get(), None);
    }
}
