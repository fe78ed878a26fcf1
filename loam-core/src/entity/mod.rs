//! Entities living in a world.
//!
//! The world stores entities as trait objects in an [`EntityArena`] and tracks
//! which chunk each one is in. Entity logic runs from [`Entity::tick`], which
//! receives the ticking transaction.

mod arena;
mod entity_types;
mod lightning;

pub use arena::EntityHandle;
pub(crate) use arena::EntityArena;
pub use entity_types::{EntityDecoder, EntityTypes};
pub use lightning::Lightning;

use std::any::Any;

use loam_utils::{Identifier, math::Vector3};

use crate::world::Tx;

/// Core entity trait that all entities must implement.
pub trait Entity: Send + Sync + Any {
    /// The entity type, used to find the decoder when the entity is loaded again.
    fn kind(&self) -> &Identifier;

    /// Get the entity's position.
    fn position(&self) -> Vector3<f64>;

    /// Get the entity's rotation (yaw, pitch).
    fn rotation(&self) -> (f32, f32) {
        (0.0, 0.0)
    }

    /// Whether this entity is alive in the gameplay sense. Lightning prefers
    /// striking living entities.
    fn is_living(&self) -> bool {
        false
    }

    /// Called once per world tick while the entity's chunk is viewed.
    fn tick(&mut self, _tx: &mut Tx<'_>, _handle: EntityHandle) {}

    /// Encodes the entity for persistence. `None` means the entity is dropped
    /// when its chunk is saved.
    fn save(&self) -> Option<serde_json::Value> {
        None
    }
}

impl dyn Entity {
    /// Downcasts to a concrete entity type.
    #[must_use]
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    /// Downcasts to a concrete entity type.
    pub fn downcast_mut<T: Entity>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }
}
