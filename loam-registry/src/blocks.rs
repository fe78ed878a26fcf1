//! Block state registry.

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use loam_utils::{BlockStateId, Identifier};
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::RegistryExt;

/// The value of a single block state property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean property such as `lit`.
    Bool(bool),
    /// An integer property such as `level`.
    Int(i32),
    /// An enum-like property such as `facing`.
    Str(Cow<'static, str>),
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Str(v) => f.write_str(v),
        }
    }
}

/// The persisted encoding of a block: its name plus properties.
///
/// Properties are kept sorted so two equal states always encode, compare and
/// hash the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    /// The block name, e.g. `minecraft:water`.
    pub name: Identifier,
    /// The state properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<Cow<'static, str>, PropertyValue>,
}

impl BlockState {
    /// Creates a state without properties.
    #[must_use]
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            properties: BTreeMap::new(),
        }
    }

    /// Returns the state with one more property set.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: PropertyValue) -> Self {
        self.properties.insert(Cow::Borrowed(key), value);
        self
    }

    /// Reads an integer property.
    #[must_use]
    pub fn int(&self, key: &str) -> Option<i32> {
        match self.properties.get(key) {
            Some(PropertyValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Stable identity hash of this state, independent of its runtime id.
    #[must_use]
    pub fn identity_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (k, v)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{k}={v}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Static, per state data the engine needs without asking block behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockData {
    /// Light emitted by the block, 0-15.
    pub light_emission: u8,
    /// Light absorbed when passing through, 0 (transparent) to 15 (opaque).
    pub light_filter: u8,
    /// Whether the state lives on the liquid layer.
    pub liquid: bool,
}

impl BlockData {
    /// Data for an ordinary opaque block.
    pub const SOLID: BlockData = BlockData {
        light_emission: 0,
        light_filter: 15,
        liquid: false,
    };

    /// Data for air and other fully transparent blocks.
    pub const TRANSPARENT: BlockData = BlockData {
        light_emission: 0,
        light_filter: 0,
        liquid: false,
    };
}

struct BlockEntry {
    state: BlockState,
    hash: u64,
    data: BlockData,
}

/// Maps runtime ids to block states and back.
///
/// Runtime id 0 is always `minecraft:air`.
pub struct BlockRegistry {
    entries: Vec<BlockEntry>,
    by_state: FxHashMap<BlockState, BlockStateId>,
    by_name: FxHashMap<Identifier, BlockStateId>,
    allows_registering: bool,
}

impl BlockRegistry {
    /// The runtime id of air.
    pub const AIR: BlockStateId = BlockStateId(0);

    /// Creates a registry containing only air.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            by_state: FxHashMap::default(),
            by_name: FxHashMap::default(),
            allows_registering: true,
        };
        registry.register_with(
            BlockState::new(Identifier::vanilla_static("air")),
            BlockData::TRANSPARENT,
        );
        registry
    }

    /// Registers a solid block state and returns its runtime id.
    ///
    /// # Panics
    /// Panics if the registry is frozen.
    pub fn register(&mut self, state: BlockState) -> BlockStateId {
        self.register_with(state, BlockData::SOLID)
    }

    /// Registers a block state with explicit data and returns its runtime id.
    /// Registering the same state twice returns the existing id.
    ///
    /// # Panics
    /// Panics if the registry is frozen.
    pub fn register_with(&mut self, state: BlockState, data: BlockData) -> BlockStateId {
        assert!(
            self.allows_registering,
            "Cannot register block state {state} after registry is frozen"
        );
        if let Some(id) = self.by_state.get(&state) {
            return *id;
        }
        let id = BlockStateId(self.entries.len() as u32);
        self.by_name.entry(state.name.clone()).or_insert(id);
        self.by_state.insert(state.clone(), id);
        self.entries.push(BlockEntry {
            hash: state.identity_hash(),
            state,
            data,
        });
        id
    }

    /// Looks up the state for a runtime id.
    #[must_use]
    pub fn by_id(&self, id: BlockStateId) -> Option<&BlockState> {
        self.entries.get(id.0 as usize).map(|e| &e.state)
    }

    /// Looks up the state for a runtime id that is known to be registered.
    ///
    /// # Panics
    /// Panics if no block is registered under `id`; ids only come from this
    /// registry, so this is a configuration error.
    #[must_use]
    #[track_caller]
    pub fn state(&self, id: BlockStateId) -> &BlockState {
        match self.by_id(id) {
            Some(state) => state,
            None => panic!("No block state registered for runtime id {}", id.0),
        }
    }

    /// Looks up the runtime id of a state.
    #[must_use]
    pub fn id_of(&self, state: &BlockState) -> Option<BlockStateId> {
        self.by_state.get(state).copied()
    }

    /// The first state registered under a name.
    #[must_use]
    pub fn default_state(&self, name: &Identifier) -> Option<BlockStateId> {
        self.by_name.get(name).copied()
    }

    /// Identity hash of a runtime id. Unknown ids hash to 0.
    #[must_use]
    pub fn hash_of(&self, id: BlockStateId) -> u64 {
        self.entries.get(id.0 as usize).map_or(0, |e| e.hash)
    }

    /// Static data of a runtime id. Unknown ids are treated as air.
    #[must_use]
    pub fn data(&self, id: BlockStateId) -> BlockData {
        self.entries
            .get(id.0 as usize)
            .map_or(BlockData::TRANSPARENT, |e| e.data)
    }

    /// Iterates every registered state with its runtime id.
    pub fn iter(&self) -> impl Iterator<Item = (BlockStateId, &BlockState)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (BlockStateId(i as u32), &e.state))
    }

    /// Number of registered states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, air is registered on creation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RegistryExt for BlockRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_round_trip() {
        let mut registry = BlockRegistry::new();
        let stone = registry.register(BlockState::new(Identifier::vanilla_static("stone")));
        assert_eq!(stone, BlockStateId(1));
        assert_eq!(registry.state(stone).name, Identifier::vanilla_static("stone"));
        assert_eq!(
            registry.id_of(&BlockState::new(Identifier::vanilla_static("stone"))),
            Some(stone)
        );
        assert_eq!(
            registry.register(BlockState::new(Identifier::vanilla_static("stone"))),
            stone
        );
    }

    #[test]
    fn test_properties_change_hash() {
        let name = Identifier::vanilla_static("water");
        let a = BlockState::new(name.clone()).with("level", PropertyValue::Int(0));
        let b = BlockState::new(name).with("level", PropertyValue::Int(1));
        assert_ne!(a.identity_hash(), b.identity_hash());
        assert_eq!(a.identity_hash(), a.clone().identity_hash());
        assert_eq!(a.to_string(), "minecraft:water[level=0]");
    }

    #[test]
    #[should_panic(expected = "No block state registered")]
    fn test_unknown_runtime_id_is_fatal() {
        let registry = BlockRegistry::new();
        let _ = registry.state(BlockStateId(42));
    }

    #[test]
    #[should_panic(expected = "after registry is frozen")]
    fn test_frozen_registry_rejects() {
        let mut registry = BlockRegistry::new();
        registry.freeze();
        registry.register(BlockState::new(Identifier::vanilla_static("stone")));
    }
}
