//! Generation checked storage for entities.

use std::mem;

use loam_utils::ChunkPos;

use super::Entity;

/// A stable reference to an entity, valid until the entity is removed.
///
/// Handles of removed entities never resolve again, even if their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

pub(crate) struct EntityEntry {
    /// `None` while the entity is taken out for its tick.
    pub(crate) entity: Option<Box<dyn Entity>>,
    /// The chunk whose entity list holds this handle.
    pub(crate) chunk: ChunkPos,
    /// Set when the entity is removed while taken out.
    pub(crate) remove_after_tick: bool,
}

struct Slot {
    generation: u32,
    entry: Option<EntityEntry>,
}

/// All entities of a world, indexed by handle.
pub(crate) struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl EntityArena {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, entity: Box<dyn Entity>, chunk: ChunkPos) -> EntityHandle {
        let entry = EntityEntry {
            entity: Some(entity),
            chunk,
            remove_after_tick: false,
        };
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return EntityHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        EntityHandle {
            index,
            generation: 0,
        }
    }

    pub(crate) fn entry(&self, handle: EntityHandle) -> Option<&EntityEntry> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_ref())
    }

    pub(crate) fn entry_mut(&mut self, handle: EntityHandle) -> Option<&mut EntityEntry> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_mut())
    }

    pub(crate) fn get(&self, handle: EntityHandle) -> Option<&dyn Entity> {
        self.entry(handle).and_then(|e| e.entity.as_deref())
    }

    pub(crate) fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut dyn Entity> {
        match self.entry_mut(handle) {
            Some(EntityEntry {
                entity: Some(entity),
                ..
            }) => Some(entity.as_mut()),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, handle: EntityHandle) -> bool {
        self.entry(handle).is_some()
    }

    /// Takes the entity out of its slot so it can be ticked with the transaction.
    pub(crate) fn take(&mut self, handle: EntityHandle) -> Option<Box<dyn Entity>> {
        self.entry_mut(handle).and_then(|e| e.entity.take())
    }

    /// Puts a taken entity back. Returns whether it was removed in the meantime.
    pub(crate) fn put_back(&mut self, handle: EntityHandle, entity: Box<dyn Entity>) -> bool {
        match self.entry_mut(handle) {
            Some(entry) => {
                entry.entity = Some(entity);
                mem::take(&mut entry.remove_after_tick)
            }
            None => false,
        }
    }

    /// Frees the slot of an entity that is not taken out.
    pub(crate) fn remove(&mut self, handle: EntityHandle) -> Option<(Box<dyn Entity>, ChunkPos)> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.as_ref()?;
        entry.entity.as_ref()?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        entry.entity.map(|entity| (entity, entry.chunk))
    }

    pub(crate) fn handles(&self) -> Vec<EntityHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.entry.is_some())
            .map(|(i, s)| EntityHandle {
                index: i as u32,
                generation: s.generation,
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
