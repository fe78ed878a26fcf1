//! Outbound notifications of world changes.

use loam_utils::{BlockPos, BlockStateId, ChunkPos, Identifier, math::Vector3};

use crate::chunk::LevelChunk;
use crate::entity::{Entity, EntityHandle};

/// A sound played at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    /// The sound event.
    pub name: Identifier,
    /// Volume, 1.0 is normal.
    pub volume: f32,
    /// Pitch, 1.0 is normal.
    pub pitch: f32,
}

impl Sound {
    /// Thunder following a lightning strike.
    pub const THUNDER: Sound = Sound::new(Identifier::vanilla_static(
        "entity.lightning_bolt.thunder",
    ));
    /// A block exploding.
    pub const EXPLOSION: Sound = Sound::new(Identifier::vanilla_static("entity.generic.explode"));
    /// Fire consuming a block.
    pub const BURN: Sound = Sound::new(Identifier::vanilla_static("block.fire.extinguish"));

    /// A sound with normal volume and pitch.
    #[must_use]
    pub const fn new(name: Identifier) -> Self {
        Self {
            name,
            volume: 1.0,
            pitch: 1.0,
        }
    }
}

/// A particle effect shown at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Particle {
    /// The particle type.
    pub name: Identifier,
    /// How many particles to show.
    pub count: u32,
}

impl Particle {
    /// A single particle of the given type.
    #[must_use]
    pub const fn new(name: Identifier) -> Self {
        Self { name, count: 1 }
    }
}

/// Receives changes of the chunks it was attached to through a
/// [`Loader`](crate::loader::Loader).
///
/// Every method is called from inside a world transaction, on the world's
/// worker thread, so implementations should queue work and return quickly.
/// They must never run a transaction on the same world.
pub trait Viewer: Send + Sync {
    /// A chunk became visible.
    fn view_chunk(&self, _pos: ChunkPos, _chunk: &LevelChunk) {}

    /// A block changed on a layer.
    fn view_block_update(&self, _pos: BlockPos, _state: BlockStateId, _layer: usize) {}

    /// An entity became visible.
    fn view_entity(&self, _handle: EntityHandle, _entity: &dyn Entity) {}

    /// An entity is no longer visible.
    fn hide_entity(&self, _handle: EntityHandle) {}

    /// A visible entity moved or turned.
    fn view_entity_movement(&self, _handle: EntityHandle, _pos: Vector3<f64>, _rotation: (f32, f32)) {}

    /// The world time, sent every second.
    fn view_time(&self, _time: i64) {}

    /// The weather changed, or the periodic weather sync.
    fn view_weather(&self, _raining: bool, _thundering: bool) {}

    /// A sound was played nearby.
    fn view_sound(&self, _pos: Vector3<f64>, _sound: &Sound) {}

    /// A particle was shown nearby.
    fn view_particle(&self, _pos: Vector3<f64>, _particle: &Particle) {}
}

/// A viewer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopViewer;

impl Viewer for NopViewer {}
