//! Block entities: auxiliary state attached to a single block position.
//!
//! A block entity is created by the block's behaviour when the block is
//! placed, lives in its chunk column, and is dropped when the block changes.

use std::any::Any;

use loam_utils::BlockPos;

use crate::world::Tx;

/// State attached to a block, such as the contents of a container.
pub trait BlockEntity: Send + Sync + Any {
    /// Called once per world tick while the chunk is within simulation range.
    fn tick(&mut self, _tx: &mut Tx<'_>, _pos: BlockPos) {}

    /// Encodes the block entity for persistence. It is decoded again by the
    /// behaviour of the block at the same position.
    fn save(&self) -> serde_json::Value;
}

impl dyn BlockEntity {
    /// Downcasts to a concrete block entity type.
    #[must_use]
    pub fn downcast_ref<T: BlockEntity>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    /// Downcasts to a concrete block entity type.
    pub fn downcast_mut<T: BlockEntity>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }
}
