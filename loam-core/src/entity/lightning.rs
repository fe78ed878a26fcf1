//! The lightning bolt spawned by thunderstorms.

use loam_utils::{Identifier, math::Vector3};

use super::{Entity, EntityHandle};
use crate::world::Tx;

/// `minecraft:lightning_bolt`
pub static LIGHTNING_BOLT: Identifier = Identifier::vanilla_static("lightning_bolt");

/// A short lived lightning strike. It is never persisted.
#[derive(Debug, Clone)]
pub struct Lightning {
    pos: Vector3<f64>,
    age: u32,
}

impl Lightning {
    /// Ticks a bolt stays in the world before removing itself.
    pub const LIFETIME: u32 = 10;

    /// Creates a bolt striking `pos`.
    #[must_use]
    pub const fn new(pos: Vector3<f64>) -> Self {
        Self { pos, age: 0 }
    }

    /// Ticks this bolt has existed for.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }
}

impl Entity for Lightning {
    fn kind(&self) -> &Identifier {
        &LIGHTNING_BOLT
    }

    fn position(&self) -> Vector3<f64> {
        self.pos
    }

    fn tick(&mut self, tx: &mut Tx<'_>, handle: EntityHandle) {
        self.age += 1;
        if self.age >= Self::LIFETIME {
            tx.remove_entity(handle);
        }
    }
}
