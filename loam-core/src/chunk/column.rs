//! A loaded chunk column: blocks plus everything attached to them.

use std::sync::Arc;

use loam_utils::BlockPos;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::block_entity::BlockEntity;
use crate::chunk::LevelChunk;
use crate::entity::EntityHandle;
use crate::loader::LoaderId;
use crate::world::Viewer;

/// A viewer attached to a column by a loader.
pub(crate) struct ViewerEntry {
    pub(crate) loader: LoaderId,
    pub(crate) viewer: Arc<dyn Viewer>,
}

/// One cached chunk column.
pub(crate) struct Column {
    pub(crate) chunk: LevelChunk,
    pub(crate) block_entities: FxHashMap<BlockPos, Box<dyn BlockEntity>>,
    /// Handles of the entities inside this column.
    pub(crate) entities: Vec<EntityHandle>,
    pub(crate) viewers: SmallVec<[ViewerEntry; 2]>,
    /// Whether the column differs from what the provider has.
    pub(crate) modified: bool,
}

impl Column {
    pub(crate) fn new(chunk: LevelChunk) -> Self {
        Self {
            chunk,
            block_entities: FxHashMap::default(),
            entities: Vec::new(),
            viewers: SmallVec::new(),
            modified: false,
        }
    }

    /// Attaches a viewer. Returns false if the loader was already attached.
    pub(crate) fn add_viewer(&mut self, loader: LoaderId, viewer: Arc<dyn Viewer>) -> bool {
        if self.viewers.iter().any(|v| v.loader == loader) {
            return false;
        }
        self.viewers.push(ViewerEntry { loader, viewer });
        true
    }

    /// Detaches a viewer, returning it if it was attached.
    pub(crate) fn remove_viewer(&mut self, loader: LoaderId) -> Option<Arc<dyn Viewer>> {
        let index = self.viewers.iter().position(|v| v.loader == loader)?;
        Some(self.viewers.swap_remove(index).viewer)
    }

    /// Clones the attached viewers so they can be notified while the column is borrowed elsewhere.
    pub(crate) fn viewer_list(&self) -> SmallVec<[Arc<dyn Viewer>; 2]> {
        self.viewers.iter().map(|v| Arc::clone(&v.viewer)).collect()
    }

    pub(crate) fn remove_entity(&mut self, handle: EntityHandle) -> bool {
        match self.entities.iter().position(|h| *h == handle) {
            Some(index) => {
                self.entities.swap_remove(index);
                self.modified = true;
                true
            }
            None => false,
        }
    }
}
