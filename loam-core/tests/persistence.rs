//! Saving and reloading columns, settings and player spawns.

mod common;

use std::sync::Arc;

use common::{Counter, Fixture, Pig};
use loam_core::{
    DiskProvider, MemoryProvider, Provider, SetOpts, WorldConfig, entity::EntityTypes,
    world::Dimension,
};
use loam_utils::{BlockPos, ChunkPos, math::Vector3};
use uuid::Uuid;

#[test]
fn test_evicted_column_comes_back_intact() {
    let fixture = Fixture::new();
    let provider = Arc::new(MemoryProvider::new());
    let world = fixture.world_with(Arc::clone(&provider) as Arc<dyn Provider>);
    let (stone, chest) = (fixture.blocks.stone, fixture.blocks.chest);
    let chest_pos = BlockPos::new(1, 64, 1);
    let stone_pos = BlockPos::new(2, 64, 2);

    world
        .exec(move |tx| {
            tx.set_block(stone_pos, stone, SetOpts::default());
            tx.set_block(chest_pos, chest, SetOpts::default());
            if let Some(counter) = tx
                .block_entity(chest_pos)
                .and_then(|e| e.downcast_mut::<Counter>())
            {
                counter.value = 42;
            }
            tx.add_entity(Pig::at(3.5, 64.0, 3.5));
        })
        .expect("open");
    assert_eq!(world.collect_garbage().expect("open"), 1);
    assert_eq!(world.exec(|tx| tx.loaded_chunks()).expect("open"), 0);
    assert_eq!(world.exec(|tx| tx.entity_count()).expect("open"), 0);

    let (block, counter, pigs) = world
        .exec(move |tx| {
            let block = tx.block(stone_pos);
            let counter = tx
                .block_entity(chest_pos)
                .and_then(|e| e.downcast_ref::<Counter>())
                .map(|c| c.value);
            let pigs: Vec<Pig> = tx
                .entities()
                .into_iter()
                .filter_map(|h| tx.entity(h))
                .filter_map(|e| e.downcast_ref::<Pig>())
                .cloned()
                .collect();
            (block, counter, pigs)
        })
        .expect("open");
    assert_eq!(block, stone);
    assert_eq!(counter, Some(42));
    assert_eq!(
        pigs,
        vec![Pig {
            pos: Vector3::new(3.5, 64.0, 3.5)
        }]
    );
}

#[test]
fn test_save_keeps_columns_loaded() {
    let fixture = Fixture::new();
    let provider = Arc::new(MemoryProvider::new());
    let world = fixture.world_with(Arc::clone(&provider) as Arc<dyn Provider>);
    let stone = fixture.blocks.stone;
    world
        .exec(move |tx| tx.set_block(BlockPos::new(0, 0, 0), stone, SetOpts::default()))
        .expect("open");

    assert_eq!(world.save().expect("open"), 1);
    world.close().expect("closes");
    assert!(provider.has_column(ChunkPos::new(0, 0), Dimension::Overworld));
    assert!(!provider.has_column(ChunkPos::new(0, 0), Dimension::Nether));
    assert!(provider.settings().expect("memory").is_some());
}

#[test]
fn test_disk_world_survives_reopening() {
    let fixture = Fixture::new();
    let dir = tempfile::tempdir().expect("temp dir");
    let stone = fixture.blocks.stone;
    let pos = BlockPos::new(-20, 12, 33);
    let player = Uuid::new_v4();
    let open = || {
        let provider = DiskProvider::open(dir.path()).expect("world dir");
        fixture.world_with(Arc::new(provider))
    };

    let world = open();
    world
        .exec(move |tx| {
            tx.set_block(pos, stone, SetOpts::default());
            tx.set_time(5_000);
            tx.set_player_spawn(player, BlockPos::new(7, 70, 7));
        })
        .expect("open");
    world.close().expect("closes");
    drop(world);

    let world = open();
    assert_eq!(world.settings().time, 5_000);
    let (block, spawn) = world
        .exec(move |tx| (tx.block(pos), tx.player_spawn(player)))
        .expect("open");
    assert_eq!(block, stone);
    assert_eq!(spawn, BlockPos::new(7, 70, 7));
    assert_eq!(
        world.exec(|tx| tx.player_spawn(Uuid::new_v4())).expect("open"),
        world.settings().spawn
    );
}

#[test]
fn test_read_only_world_writes_nothing() {
    let fixture = Fixture::new();
    let provider = Arc::new(MemoryProvider::new());
    let world = WorldConfig {
        provider: Arc::clone(&provider) as Arc<dyn Provider>,
        read_only: true,
        ..fixture.config()
    }
    .build()
    .expect("world opens");
    assert!(world.is_read_only());
    let stone = fixture.blocks.stone;
    let player = Uuid::new_v4();

    world
        .exec(move |tx| {
            tx.set_block(BlockPos::new(0, 64, 0), stone, SetOpts::default());
            tx.set_player_spawn(player, BlockPos::new(1, 1, 1));
        })
        .expect("open");
    assert_eq!(world.save().expect("open"), 0);
    assert_eq!(world.collect_garbage().expect("open"), 1);
    world.close().expect("closes");

    assert_eq!(provider.column_count(), 0);
    assert!(provider.settings().expect("memory").is_none());
    assert!(provider.load_player_spawn(player).expect("memory").is_none());
}

#[test]
fn test_unknown_entities_are_dropped_on_load() {
    let fixture = Fixture::new();
    let provider: Arc<dyn Provider> = Arc::new(MemoryProvider::new());
    let world = fixture.world_with(Arc::clone(&provider));
    world
        .exec(|tx| {
            tx.add_entity(Pig::at(1.0, 64.0, 1.0));
        })
        .expect("open");
    world.close().expect("closes");
    drop(world);

    let world = WorldConfig {
        provider,
        entity_types: Arc::new(EntityTypes::new()),
        ..fixture.config()
    }
    .build()
    .expect("world opens");
    let count = world
        .exec(|tx| {
            tx.block(BlockPos::new(1, 64, 1));
            tx.entity_count()
        })
        .expect("open");
    assert_eq!(count, 0);
}
