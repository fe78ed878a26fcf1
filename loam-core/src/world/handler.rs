//! Hooks for reacting to and cancelling world events.

use loam_utils::{BlockPos, BlockStateId, math::Vector3};

use crate::entity::{Entity, EntityHandle};
use crate::world::Sound;

/// Passed to cancellable hooks.
#[derive(Debug, Default)]
pub struct Context {
    cancelled: bool,
}

impl Context {
    /// Creates a context that is not cancelled.
    #[must_use]
    pub const fn new() -> Self {
        Self { cancelled: false }
    }

    /// Cancels the event.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether a hook cancelled the event.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// An explosion about to happen. Hooks may shrink what it affects.
#[derive(Debug, Clone)]
pub struct Explosion {
    /// The centre of the explosion.
    pub center: Vector3<f64>,
    /// Entities that will be hit.
    pub entities: Vec<EntityHandle>,
    /// Blocks that will be destroyed.
    pub blocks: Vec<BlockPos>,
    /// Radius in blocks.
    pub radius: f64,
}

/// Receives world events. Every method defaults to doing nothing.
///
/// Hooks run inside the transaction that caused the event, on the world's
/// worker thread. They must not run transactions on the same world.
pub trait Handler: Send + Sync {
    /// Liquid is about to flow from `from` into `into`, replacing `replaced`.
    fn handle_liquid_flow(
        &self,
        _ctx: &mut Context,
        _from: BlockPos,
        _into: BlockPos,
        _liquid: BlockStateId,
        _replaced: BlockStateId,
    ) {
    }

    /// Liquid at `pos` is about to decay to `after`, `None` meaning it disappears.
    fn handle_liquid_decay(
        &self,
        _ctx: &mut Context,
        _pos: BlockPos,
        _before: BlockStateId,
        _after: Option<BlockStateId>,
    ) {
    }

    /// Fire is about to spread from `from` to `to`.
    fn handle_fire_spread(&self, _ctx: &mut Context, _from: BlockPos, _to: BlockPos) {}

    /// The block at `pos` is about to burn away.
    fn handle_block_burn(&self, _ctx: &mut Context, _pos: BlockPos) {}

    /// An explosion is about to happen.
    fn handle_explosion(&self, _ctx: &mut Context, _explosion: &mut Explosion) {}

    /// A sound is about to be played.
    fn handle_sound(&self, _ctx: &mut Context, _sound: &Sound, _pos: Vector3<f64>) {}

    /// An entity was added to the world.
    fn handle_entity_spawn(&self, _handle: EntityHandle, _entity: &dyn Entity) {}

    /// An entity was removed from the world.
    fn handle_entity_despawn(&self, _handle: EntityHandle, _entity: &dyn Entity) {}

    /// The world is closing. Called once, inside the final transaction.
    fn handle_close(&self) {}
}

/// A handler that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopHandler;

impl Handler for NopHandler {}
