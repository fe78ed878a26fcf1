//! Registry for block behaviours, indexed by runtime id.

use std::sync::Arc;

use loam_registry::{BlockRegistry, BlockState, RegistryExt};
use loam_utils::{BlockStateId, Identifier};
use rustc_hash::{FxHashMap, FxHashSet};

use super::BlockBehaviour;

/// Maps runtime ids to their behaviour. Ids without one are inert.
pub struct BlockBehaviours {
    behaviours: FxHashMap<BlockStateId, Arc<dyn BlockBehaviour>>,
    random_tickers: FxHashSet<BlockStateId>,
    allows_registering: bool,
}

impl BlockBehaviours {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            behaviours: FxHashMap::default(),
            random_tickers: FxHashSet::default(),
            allows_registering: true,
        }
    }

    /// Attaches a behaviour to one block state.
    ///
    /// # Panics
    /// Panics if the state has no runtime id in `blocks`, or if this registry is frozen.
    #[track_caller]
    pub fn register(
        &mut self,
        blocks: &BlockRegistry,
        state: &BlockState,
        behaviour: Arc<dyn BlockBehaviour>,
    ) {
        let Some(id) = blocks.id_of(state) else {
            panic!("Block {state} has behaviour but no registered runtime state");
        };
        self.insert(id, behaviour);
    }

    /// Attaches a behaviour to every state of a block. Returns the number of states.
    ///
    /// # Panics
    /// Panics if no state of the block is registered in `blocks`, or if this registry is frozen.
    #[track_caller]
    pub fn register_all(
        &mut self,
        blocks: &BlockRegistry,
        name: &Identifier,
        behaviour: &Arc<dyn BlockBehaviour>,
    ) -> usize {
        let ids: Vec<BlockStateId> = blocks
            .iter()
            .filter(|(_, state)| state.name == *name)
            .map(|(id, _)| id)
            .collect();
        assert!(
            !ids.is_empty(),
            "Block {name} has behaviour but no registered runtime state"
        );
        for id in &ids {
            self.insert(*id, Arc::clone(behaviour));
        }
        ids.len()
    }

    #[track_caller]
    fn insert(&mut self, id: BlockStateId, behaviour: Arc<dyn BlockBehaviour>) {
        assert!(
            self.allows_registering,
            "Cannot register block behaviour after registry is frozen"
        );
        if behaviour.as_random_ticker().is_some() {
            self.random_tickers.insert(id);
        } else {
            self.random_tickers.remove(&id);
        }
        self.behaviours.insert(id, behaviour);
    }

    /// The behaviour of a runtime id.
    #[must_use]
    pub fn get(&self, id: BlockStateId) -> Option<&dyn BlockBehaviour> {
        self.behaviours.get(&id).map(|b| &**b)
    }

    /// Whether a runtime id reacts to random ticks.
    #[inline]
    #[must_use]
    pub fn random_ticks(&self, id: BlockStateId) -> bool {
        self.random_tickers.contains(&id)
    }

    /// Whether liquid may stay at the position of this runtime id.
    #[must_use]
    pub fn can_hold_liquid(&self, id: BlockStateId) -> bool {
        id == BlockRegistry::AIR || self.get(id).is_some_and(|b| b.can_hold_liquid())
    }

    /// Number of runtime ids with a behaviour.
    #[must_use]
    pub fn len(&self) -> usize {
        self.behaviours.len()
    }

    /// Whether no behaviour is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behaviours.is_empty()
    }
}

impl RegistryExt for BlockBehaviours {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}

impl Default for BlockBehaviours {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use loam_registry::{PropertyValue, vanilla};

    use super::*;
    use crate::behavior::RandomTicker;
    use crate::world::Tx;
    use loam_utils::BlockPos;

    struct Inert;
    impl BlockBehaviour for Inert {}

    struct Grows;
    impl BlockBehaviour for Grows {
        fn as_random_ticker(&self) -> Option<&dyn RandomTicker> {
            Some(self)
        }
    }
    impl RandomTicker for Grows {
        fn random_tick(&self, _tx: &mut Tx<'_>, _pos: BlockPos, _state: BlockStateId) {}
    }

    fn blocks() -> BlockRegistry {
        let mut blocks = BlockRegistry::new();
        vanilla::register_blocks(&mut blocks);
        blocks
    }

    #[test]
    fn test_register_all_states() {
        let blocks = blocks();
        let mut behaviours = BlockBehaviours::new();
        let grows: Arc<dyn BlockBehaviour> = Arc::new(Grows);
        assert_eq!(behaviours.register_all(&blocks, &vanilla::WATER, &grows), 16);
        let level_3 = blocks
            .id_of(&BlockState::new(vanilla::WATER).with("level", PropertyValue::Int(3)))
            .expect("registered");
        assert!(behaviours.random_ticks(level_3));
        assert!(behaviours.get(BlockRegistry::AIR).is_none());
    }

    #[test]
    #[should_panic(expected = "no registered runtime state")]
    fn test_unregistered_state_is_fatal() {
        let blocks = blocks();
        let mut behaviours = BlockBehaviours::new();
        behaviours.register(
            &blocks,
            &BlockState::new(Identifier::vanilla_static("torch")),
            Arc::new(Inert),
        );
    }

    #[test]
    fn test_inert_behaviour_holds_no_liquid() {
        let blocks = blocks();
        let mut behaviours = BlockBehaviours::new();
        behaviours.register(&blocks, &BlockState::new(vanilla::STONE), Arc::new(Inert));
        let stone = blocks.default_state(&vanilla::STONE).expect("registered");
        assert!(!behaviours.can_hold_liquid(stone));
        assert!(behaviours.can_hold_liquid(BlockRegistry::AIR));
        assert!(!behaviours.random_ticks(stone));
    }
}
