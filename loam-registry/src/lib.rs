//! # Loam registry
//!
//! Bidirectional maps between compact runtime ids and the values they stand
//! for. A [`Registry`] is built once at startup, frozen, and then handed to the
//! world by `Arc`; nothing in here is global.

pub mod blocks;
pub mod items;
pub mod vanilla;

pub use blocks::{BlockData, BlockRegistry, BlockState, PropertyValue};
pub use items::{ItemId, ItemRegistry};

/// Shared behaviour of every registry.
pub trait RegistryExt {
    /// Prevents any further registration.
    fn freeze(&mut self);
}

/// All registries the engine needs.
pub struct Registry {
    /// Block states.
    pub blocks: BlockRegistry,
    /// Items.
    pub items: ItemRegistry,
}

impl Registry {
    /// Creates an empty registry. Only `minecraft:air` is present.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: BlockRegistry::new(),
            items: ItemRegistry::new(),
        }
    }

    /// Creates a registry holding the basic vanilla blocks and items from [`vanilla`].
    #[must_use]
    pub fn with_vanilla() -> Self {
        let mut registry = Self::new();
        vanilla::register_blocks(&mut registry.blocks);
        vanilla::register_items(&mut registry.items);
        registry
    }
}

impl RegistryExt for Registry {
    fn freeze(&mut self) {
        self.blocks.freeze();
        self.items.freeze();
        log::debug!(
            "Registry frozen with {} block states and {} items",
            self.blocks.len(),
            self.items.len()
        );
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
