//! Item registry.

use loam_utils::Identifier;
use rustc_hash::FxHashMap;

use crate::RegistryExt;

/// Runtime id of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub i32);

/// Maps item names to runtime ids and back.
pub struct ItemRegistry {
    by_id: Vec<Identifier>,
    by_name: FxHashMap<Identifier, ItemId>,
    allows_registering: bool,
}

impl ItemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_id: Vec::new(),
            by_name: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Registers an item, returning the existing id if it is already known.
    ///
    /// # Panics
    /// Panics if the registry is frozen.
    pub fn register(&mut self, name: Identifier) -> ItemId {
        assert!(
            self.allows_registering,
            "Cannot register item {name} after registry is frozen"
        );
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        let id = ItemId(self.by_id.len() as i32);
        self.by_name.insert(name.clone(), id);
        self.by_id.push(name);
        id
    }

    /// Looks up an item by name.
    #[must_use]
    pub fn by_name(&self, name: &Identifier) -> Option<ItemId> {
        self.by_name.get(name).copied()
    }

    /// Looks up the name of an item.
    #[must_use]
    pub fn by_id(&self, id: ItemId) -> Option<&Identifier> {
        usize::try_from(id.0).ok().and_then(|i| self.by_id.get(i))
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no items are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl RegistryExt for ItemRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}
