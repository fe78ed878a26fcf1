//! Shared fixtures for the integration tests: a registry with a few test
//! blocks, behaviours that record what happened to them, a persisted entity
//! and a viewer that records every notification.
#![allow(dead_code, missing_docs)]

use std::{
    mem,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use loam_core::{
    Provider, World, WorldConfig,
    behavior::{BlockBehaviour, BlockBehaviours, NeighbourUpdateTicker, RandomTicker, ScheduledTicker},
    block_entity::BlockEntity,
    chunk::{FlatChunkGenerator, LevelChunk},
    entity::{Entity, EntityHandle, EntityTypes},
    world::{Sound, Tx, Viewer},
};
use loam_registry::{BlockData, BlockState, Registry, vanilla};
use loam_utils::{
    BlockPos, BlockStateId, ChunkPos, Identifier, locks::SyncMutex, math::Vector3,
};
use serde_json::{Value, json};

pub static PIG: Identifier = Identifier::vanilla_static("pig");
pub static CHEST: Identifier = Identifier::vanilla_static("chest");
pub static SPROUT: Identifier = Identifier::vanilla_static("sprout");

/// Runtime ids of the blocks the tests use.
#[derive(Debug, Clone, Copy)]
pub struct Blocks {
    pub stone: BlockStateId,
    pub sand: BlockStateId,
    pub glass: BlockStateId,
    pub water: BlockStateId,
    pub chest: BlockStateId,
    pub sprout: BlockStateId,
}

/// What the test behaviours observed.
#[derive(Default)]
pub struct Counters {
    pub scheduled: SyncMutex<Vec<(u64, BlockPos)>>,
    pub neighbour: SyncMutex<Vec<(BlockPos, BlockPos)>>,
    pub random: AtomicUsize,
}

/// Sand records scheduled ticks with the tick they fired on, and neighbour updates.
struct Sand(Arc<Counters>);

impl BlockBehaviour for Sand {
    fn as_scheduled_ticker(&self) -> Option<&dyn ScheduledTicker> {
        Some(self)
    }

    fn as_neighbour_update_ticker(&self) -> Option<&dyn NeighbourUpdateTicker> {
        Some(self)
    }
}

impl ScheduledTicker for Sand {
    fn scheduled_tick(&self, tx: &mut Tx<'_>, pos: BlockPos, _state: BlockStateId) {
        self.0.scheduled.lock().push((tx.current_tick(), pos));
    }
}

impl NeighbourUpdateTicker for Sand {
    fn neighbour_update_tick(
        &self,
        _tx: &mut Tx<'_>,
        pos: BlockPos,
        changed: BlockPos,
        _state: BlockStateId,
    ) {
        self.0.neighbour.lock().push((pos, changed));
    }
}

/// Glass can be waterlogged.
struct Glass;

impl BlockBehaviour for Glass {
    fn can_hold_liquid(&self) -> bool {
        true
    }
}

/// A chest carries a [`Counter`] block entity.
struct Chest;

impl BlockBehaviour for Chest {
    fn new_block_entity(&self, _state: BlockStateId) -> Option<Box<dyn BlockEntity>> {
        Some(Box::new(Counter::default()))
    }

    fn load_block_entity(&self, data: &Value) -> Option<Box<dyn BlockEntity>> {
        let value = data.get("value")?.as_u64()?;
        Some(Box::new(Counter {
            value: u32::try_from(value).ok()?,
        }))
    }
}

/// Counts its own ticks.
#[derive(Debug, Default)]
pub struct Counter {
    pub value: u32,
}

impl BlockEntity for Counter {
    fn tick(&mut self, _tx: &mut Tx<'_>, _pos: BlockPos) {
        self.value += 1;
    }

    fn save(&self) -> Value {
        json!({ "value": self.value })
    }
}

/// A sprout counts the random ticks it receives.
struct Sprout(Arc<Counters>);

impl BlockBehaviour for Sprout {
    fn as_random_ticker(&self) -> Option<&dyn RandomTicker> {
        Some(self)
    }
}

impl RandomTicker for Sprout {
    fn random_tick(&self, _tx: &mut Tx<'_>, _pos: BlockPos, _state: BlockStateId) {
        self.0.random.fetch_add(1, Ordering::Relaxed);
    }
}

/// A persisted, living entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Pig {
    pub pos: Vector3<f64>,
}

impl Pig {
    pub fn at(x: f64, y: f64, z: f64) -> Box<dyn Entity> {
        Box::new(Self {
            pos: Vector3::new(x, y, z),
        })
    }

    fn decode(data: &Value) -> Option<Box<dyn Entity>> {
        let [x, y, z]: [f64; 3] = serde_json::from_value(data.clone()).ok()?;
        Some(Self::at(x, y, z))
    }
}

impl Entity for Pig {
    fn kind(&self) -> &Identifier {
        &PIG
    }

    fn position(&self) -> Vector3<f64> {
        self.pos
    }

    fn is_living(&self) -> bool {
        true
    }

    fn save(&self) -> Option<Value> {
        Some(json!([self.pos.x, self.pos.y, self.pos.z]))
    }
}

/// Registries and behaviours shared by the worlds of one test.
pub struct Fixture {
    pub blocks: Blocks,
    pub counters: Arc<Counters>,
    pub registry: Arc<Registry>,
    pub behaviours: Arc<BlockBehaviours>,
    pub entity_types: Arc<EntityTypes>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut registry = Registry::with_vanilla();
        let chest = registry.blocks.register(BlockState::new(CHEST.clone()));
        let sprout = registry
            .blocks
            .register_with(BlockState::new(SPROUT.clone()), BlockData::TRANSPARENT);
        let blocks = Blocks {
            stone: registry.blocks.default_state(&vanilla::STONE).expect("stone"),
            sand: registry.blocks.default_state(&vanilla::SAND).expect("sand"),
            glass: registry.blocks.default_state(&vanilla::GLASS).expect("glass"),
            water: registry.blocks.default_state(&vanilla::WATER).expect("water"),
            chest,
            sprout,
        };

        let counters = Arc::new(Counters::default());
        let mut behaviours = BlockBehaviours::new();
        let sand: Arc<dyn BlockBehaviour> = Arc::new(Sand(Arc::clone(&counters)));
        let glass: Arc<dyn BlockBehaviour> = Arc::new(Glass);
        let chest_behaviour: Arc<dyn BlockBehaviour> = Arc::new(Chest);
        let sprout_behaviour: Arc<dyn BlockBehaviour> = Arc::new(Sprout(Arc::clone(&counters)));
        behaviours.register_all(&registry.blocks, &vanilla::SAND, &sand);
        behaviours.register_all(&registry.blocks, &vanilla::GLASS, &glass);
        behaviours.register_all(&registry.blocks, &CHEST, &chest_behaviour);
        behaviours.register_all(&registry.blocks, &SPROUT, &sprout_behaviour);

        let mut entity_types = EntityTypes::new();
        entity_types.register(PIG.clone(), Pig::decode);

        Self {
            blocks,
            counters,
            registry: Arc::new(registry),
            behaviours: Arc::new(behaviours),
            entity_types: Arc::new(entity_types),
        }
    }

    /// A manually ticked world with a fixed seed and no persistence.
    pub fn config(&self) -> WorldConfig {
        WorldConfig {
            behaviours: Arc::clone(&self.behaviours),
            entity_types: Arc::clone(&self.entity_types),
            seed: 1,
            autotick: false,
            ..WorldConfig::new(Arc::clone(&self.registry))
        }
    }

    pub fn world(&self) -> Arc<World> {
        self.config().build().expect("world opens")
    }

    pub fn world_with(&self, provider: Arc<dyn Provider>) -> Arc<World> {
        WorldConfig {
            provider,
            ..self.config()
        }
        .build()
        .expect("world opens")
    }

    /// A world whose bottom sixteen layers are sprouts.
    pub fn sprout_world(&self) -> Arc<World> {
        WorldConfig {
            generator: Arc::new(FlatChunkGenerator::with_layers(vec![self.blocks.sprout; 16])),
            ..self.config()
        }
        .build()
        .expect("world opens")
    }
}

/// A notification received by a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Chunk(ChunkPos),
    Block(BlockPos, BlockStateId, usize),
    Entity(EntityHandle),
    HideEntity(EntityHandle),
    Moved(EntityHandle, Vector3<f64>),
    Time(i64),
    Weather(bool, bool),
    Sound(Identifier),
}

/// A viewer that records every notification.
#[derive(Default)]
pub struct Recorder {
    events: SyncMutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        mem::take(&mut *self.events.lock())
    }

    pub fn chunks(&self) -> Vec<ChunkPos> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Chunk(pos) => Some(pos),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl Viewer for Recorder {
    fn view_chunk(&self, pos: ChunkPos, _chunk: &LevelChunk) {
        self.push(Event::Chunk(pos));
    }

    fn view_block_update(&self, pos: BlockPos, state: BlockStateId, layer: usize) {
        self.push(Event::Block(pos, state, layer));
    }

    fn view_entity(&self, handle: EntityHandle, _entity: &dyn Entity) {
        self.push(Event::Entity(handle));
    }

    fn hide_entity(&self, handle: EntityHandle) {
        self.push(Event::HideEntity(handle));
    }

    fn view_entity_movement(&self, handle: EntityHandle, pos: Vector3<f64>, _rotation: (f32, f32)) {
        self.push(Event::Moved(handle, pos));
    }

    fn view_time(&self, time: i64) {
        self.push(Event::Time(time));
    }

    fn view_weather(&self, raining: bool, thundering: bool) {
        self.push(Event::Weather(raining, thundering));
    }

    fn view_sound(&self, _pos: Vector3<f64>, sound: &Sound) {
        self.push(Event::Sound(sound.name.clone()));
    }
}
