//! Loader strategies, movement and lifecycle as seen by a viewer.

mod common;

use std::sync::Arc;

use common::{Event, Fixture, Pig, Recorder};
use loam_core::{
    LoadManual, LoadRadius, LoadRegion, LoadStrategy, Loader, SetOpts, World, world::Viewer,
};
use loam_utils::{BlockPos, ChunkPos, math::Vector3};

fn open_loader(
    world: &Arc<World>,
    x: f64,
    z: f64,
    strategy: impl LoadStrategy + 'static,
) -> (Loader, Arc<Recorder>) {
    let recorder = Recorder::new();
    let viewer: Arc<dyn Viewer> = Arc::clone(&recorder) as Arc<dyn Viewer>;
    let loader = Loader::new(world, Vector3::new(x, 64.0, z), strategy, viewer);
    // Waiting on any loader operation also waits for the registration.
    loader.load(0).expect("open");
    // Drop the time and weather sent on registration.
    recorder.take();
    (loader, recorder)
}

#[test]
fn test_radius_loads_closest_first_in_batches() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let (loader, recorder) = open_loader(&world, 8.0, 8.0, LoadRadius::new(2));

    let queued = loader.queued();
    assert_eq!(queued.len(), 13);
    assert_eq!(queued[0], ChunkPos::new(0, 0));

    assert_eq!(loader.load(5).expect("open"), 5);
    let chunks = recorder.chunks();
    assert_eq!(chunks.len(), 5);
    assert_eq!(chunks[0], ChunkPos::new(0, 0));
    assert!(chunks[1..].iter().all(|c| c.distance_squared(ChunkPos::new(0, 0)) == 1));

    assert_eq!(loader.load(100).expect("open"), 8);
    assert!(loader.queued().is_empty());
    assert_eq!(loader.loaded().len(), 13);
    assert_eq!(loader.load(1).expect("open"), 0);
}

#[test]
fn test_moving_drops_chunks_out_of_range() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let (loader, _recorder) = open_loader(&world, 8.0, 8.0, LoadRadius::new(1));
    loader.load(usize::MAX).expect("open");
    assert_eq!(loader.loaded().len(), 5);

    // One chunk over keeps the overlap.
    loader.move_to(Vector3::new(24.0, 64.0, 8.0)).expect("open");
    assert_eq!(loader.position(), ChunkPos::new(1, 0));
    let mut kept = loader.loaded();
    kept.sort_by_key(|c| (c.x(), c.z()));
    assert_eq!(kept, vec![ChunkPos::new(0, 0), ChunkPos::new(1, 0)]);
    assert_eq!(loader.queued().len(), 3);

    // Far away everything goes, and nobody views the old columns any more.
    loader.move_to(Vector3::new(1_600.0, 64.0, 0.0)).expect("open");
    assert!(loader.loaded().is_empty());
    assert_eq!(loader.queued().len(), 5);
    assert_eq!(world.collect_garbage().expect("open"), 5);
}

#[test]
fn test_entities_follow_chunk_visibility() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let pig = world.exec(|tx| tx.add_entity(Pig::at(4.0, 64.0, 4.0))).expect("open");

    let (loader, recorder) = open_loader(&world, 8.0, 8.0, LoadRadius::new(0));
    loader.load(1).expect("open");
    assert_eq!(
        recorder.take(),
        vec![Event::Chunk(ChunkPos::new(0, 0)), Event::Entity(pig)]
    );

    let stone = fixture.blocks.stone;
    let pos = BlockPos::new(3, 64, 3);
    world
        .exec(move |tx| tx.set_block(pos, stone, SetOpts::default()))
        .expect("open");
    assert_eq!(recorder.take(), vec![Event::Block(pos, stone, 0)]);

    loader.move_to(Vector3::new(400.0, 64.0, 400.0)).expect("open");
    assert_eq!(recorder.take(), vec![Event::HideEntity(pig)]);
}

#[test]
fn test_region_ignores_movement() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let region = LoadRegion::new(ChunkPos::new(-1, -1), ChunkPos::new(0, 0));
    let (loader, _recorder) = open_loader(&world, 8.0, 8.0, region);
    assert_eq!(loader.load(usize::MAX).expect("open"), 4);

    loader.move_to(Vector3::new(10_000.0, 64.0, 0.0)).expect("open");
    assert_eq!(loader.loaded().len(), 4);
    assert!(loader.queued().is_empty());
}

#[test]
fn test_manual_set_applies_on_refresh() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let manual = LoadManual::new();
    manual.add(ChunkPos::new(3, 3));
    let (loader, recorder) = open_loader(&world, 0.0, 0.0, manual.clone());
    assert_eq!(loader.load(10).expect("open"), 1);

    manual.add(ChunkPos::new(4, 4));
    assert_eq!(loader.load(10).expect("open"), 0);
    loader.refresh().expect("open");
    assert_eq!(loader.load(10).expect("open"), 1);

    manual.remove(ChunkPos::new(3, 3));
    loader.refresh().expect("open");
    assert_eq!(loader.loaded(), vec![ChunkPos::new(4, 4)]);
    assert_eq!(
        recorder.chunks(),
        vec![ChunkPos::new(3, 3), ChunkPos::new(4, 4)]
    );
}

#[test]
fn test_change_radius() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let (loader, _recorder) = open_loader(&world, 8.0, 8.0, LoadRadius::new(2));
    loader.load(usize::MAX).expect("open");
    loader.change_radius(1).expect("open");
    assert_eq!(loader.loaded().len(), 5);
    assert!(loader.queued().is_empty());
}

#[test]
fn test_closed_loader_does_nothing() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let (loader, _recorder) = open_loader(&world, 8.0, 8.0, LoadRadius::new(1));
    loader.load(2).expect("open");
    loader.close().expect("open");

    assert!(loader.is_closed());
    assert!(loader.loaded().is_empty());
    assert_eq!(loader.load(5).expect("open"), 0);
    assert_eq!(world.collect_garbage().expect("open"), 2);
    // The world no longer ticks once the only loader is gone.
    let before = world.settings().current_tick;
    world.tick_now().expect("open");
    world.tick_now().expect("open");
    assert!(world.settings().current_tick <= before + 1);
}

#[test]
fn test_dropping_loader_detaches_it() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let (loader, _recorder) = open_loader(&world, 8.0, 8.0, LoadRadius::new(1));
    loader.load(usize::MAX).expect("open");
    drop(loader);
    assert_eq!(world.collect_garbage().expect("open"), 5);
}

#[test]
fn test_change_world() {
    let fixture = Fixture::new();
    let first = fixture.world();
    let second = fixture.world();
    let (mut loader, recorder) = open_loader(&first, 8.0, 8.0, LoadRadius::new(0));
    loader.load(1).expect("open");

    loader.change_world(&second);
    assert!(Arc::ptr_eq(loader.world(), &second));
    assert!(loader.loaded().is_empty());
    assert_eq!(loader.load(1).expect("open"), 1);
    assert_eq!(recorder.chunks(), vec![ChunkPos::new(0, 0), ChunkPos::new(0, 0)]);

    assert_eq!(first.collect_garbage().expect("open"), 1);
    assert_eq!(second.collect_garbage().expect("open"), 0);
}
