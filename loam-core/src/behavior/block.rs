use loam_utils::{BlockPos, BlockStateId};

use crate::block_entity::BlockEntity;
use crate::world::Tx;

/// Logic attached to one or more block states.
///
/// Every method has a default, so a behaviour only overrides the capabilities
/// its block has.
pub trait BlockBehaviour: Send + Sync {
    /// Returns the random tick capability, if the block has one.
    fn as_random_ticker(&self) -> Option<&dyn RandomTicker> {
        None
    }

    /// Returns the scheduled tick capability, if the block has one.
    fn as_scheduled_ticker(&self) -> Option<&dyn ScheduledTicker> {
        None
    }

    /// Returns the neighbour update capability, if the block has one.
    fn as_neighbour_update_ticker(&self) -> Option<&dyn NeighbourUpdateTicker> {
        None
    }

    /// Whether a liquid may share the block's position. Placing a block that
    /// cannot hold liquid clears the liquid layer.
    fn can_hold_liquid(&self) -> bool {
        false
    }

    /// Creates the block entity for a freshly placed block.
    fn new_block_entity(&self, _state: BlockStateId) -> Option<Box<dyn BlockEntity>> {
        None
    }

    /// Rebuilds a persisted block entity.
    fn load_block_entity(&self, _data: &serde_json::Value) -> Option<Box<dyn BlockEntity>> {
        None
    }
}

/// A block that reacts to random ticks.
pub trait RandomTicker {
    /// Called when the random tick sampler hits this block.
    fn random_tick(&self, tx: &mut Tx<'_>, pos: BlockPos, state: BlockStateId);
}

/// A block that reacts to scheduled updates.
pub trait ScheduledTicker {
    /// Called when an update scheduled by this block fires.
    fn scheduled_tick(&self, tx: &mut Tx<'_>, pos: BlockPos, state: BlockStateId);
}

/// A block that reacts to changes next to it.
pub trait NeighbourUpdateTicker {
    /// Called after the block at `changed` was changed.
    fn neighbour_update_tick(
        &self,
        tx: &mut Tx<'_>,
        pos: BlockPos,
        changed: BlockPos,
        state: BlockStateId,
    );
}
