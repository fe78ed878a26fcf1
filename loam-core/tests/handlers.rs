//! Handler hooks that veto liquid, fire and sound events, and the entity lifecycle hooks.

mod common;

use std::sync::Arc;

use common::{Event, Fixture, Pig, Recorder};
use loam_core::{
    LoadRadius, Loader, SetOpts,
    entity::{Entity, EntityHandle},
    world::{Context, Handler, NopHandler, Sound, Viewer},
};
use loam_registry::{BlockRegistry, vanilla};
use loam_utils::{BlockPos, BlockStateId, locks::SyncMutex, math::Vector3};

/// Cancels everything it can and records the name of every hook it saw.
struct Veto(Arc<SyncMutex<Vec<&'static str>>>);

impl Handler for Veto {
    fn handle_liquid_flow(
        &self,
        ctx: &mut Context,
        _from: BlockPos,
        _into: BlockPos,
        _liquid: BlockStateId,
        _replaced: BlockStateId,
    ) {
        self.0.lock().push("flow");
        ctx.cancel();
    }

    fn handle_liquid_decay(
        &self,
        ctx: &mut Context,
        _pos: BlockPos,
        _before: BlockStateId,
        _after: Option<BlockStateId>,
    ) {
        self.0.lock().push("decay");
        ctx.cancel();
    }

    fn handle_fire_spread(&self, ctx: &mut Context, _from: BlockPos, _to: BlockPos) {
        self.0.lock().push("spread");
        ctx.cancel();
    }

    fn handle_block_burn(&self, ctx: &mut Context, _pos: BlockPos) {
        self.0.lock().push("burn");
        ctx.cancel();
    }

    fn handle_sound(&self, ctx: &mut Context, _sound: &Sound, _pos: Vector3<f64>) {
        self.0.lock().push("sound");
        ctx.cancel();
    }
}

#[test]
fn test_cancelled_hooks_change_nothing() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let recorder = Recorder::new();
    let viewer: Arc<dyn Viewer> = Arc::clone(&recorder) as Arc<dyn Viewer>;
    let loader = Loader::new(&world, Vector3::new(8.0, 64.0, 8.0), LoadRadius::new(0), viewer);
    loader.load(usize::MAX).expect("open");

    let (stone, water) = (fixture.blocks.stone, fixture.blocks.water);
    let glowstone = fixture
        .registry
        .blocks
        .default_state(&vanilla::GLOWSTONE)
        .expect("glowstone");
    let source = BlockPos::new(3, 64, 3);
    let beside = BlockPos::new(4, 64, 3);
    let fuel = BlockPos::new(2, 64, 2);
    let above = BlockPos::new(2, 65, 2);
    world
        .exec(move |tx| {
            tx.set_liquid(source, Some(water));
            tx.set_block(fuel, stone, SetOpts::default());
        })
        .expect("open");

    let seen = Arc::new(SyncMutex::new(Vec::new()));
    world.handle(Veto(Arc::clone(&seen))).expect("open");
    recorder.take();

    world
        .exec(move |tx| {
            assert!(!tx.flow_liquid(source, beside, water));
            assert_eq!(tx.liquid(beside), None);
            assert!(!tx.decay_liquid(source, None));
            assert_eq!(tx.liquid(source), Some(water));
            assert!(!tx.spread_fire(fuel, above, glowstone));
            assert_eq!(tx.block(above), BlockRegistry::AIR);
            assert!(!tx.burn_block(fuel));
            assert_eq!(tx.block(fuel), stone);
            tx.play_sound(Vector3::new(8.0, 64.0, 8.0), Sound::EXPLOSION);
        })
        .expect("open");
    assert_eq!(*seen.lock(), vec!["flow", "decay", "spread", "burn", "sound"]);
    assert!(recorder.take().is_empty());

    world.handle(NopHandler).expect("open");
    world
        .exec(move |tx| {
            assert!(tx.flow_liquid(source, beside, water));
            assert_eq!(tx.liquid(beside), Some(water));
            assert!(tx.burn_block(fuel));
            assert_eq!(tx.block(fuel), BlockRegistry::AIR);
        })
        .expect("open");
    let events = recorder.take();
    assert!(events.contains(&Event::Block(beside, water, 0)));
    assert!(events.contains(&Event::Sound(Sound::BURN.name)));
}

/// Records spawns as `true` and despawns as `false`.
struct Lifecycle(Arc<SyncMutex<Vec<(bool, EntityHandle)>>>);

impl Handler for Lifecycle {
    fn handle_entity_spawn(&self, handle: EntityHandle, _entity: &dyn Entity) {
        self.0.lock().push((true, handle));
    }

    fn handle_entity_despawn(&self, handle: EntityHandle, _entity: &dyn Entity) {
        self.0.lock().push((false, handle));
    }
}

#[test]
fn test_entity_spawn_and_despawn_reach_the_handler() {
    let fixture = Fixture::new();
    let world = fixture.world();
    let seen = Arc::new(SyncMutex::new(Vec::new()));
    world.handle(Lifecycle(Arc::clone(&seen))).expect("open");

    let (first, second) = world
        .exec(|tx| {
            let first = tx.add_entity(Pig::at(1.0, 64.0, 1.0));
            let second = tx.add_entity(Pig::at(40.0, 64.0, -3.0));
            assert!(tx.remove_entity(first).is_some());
            (first, second)
        })
        .expect("open");
    assert_eq!(
        *seen.lock(),
        vec![(true, first), (true, second), (false, first)]
    );

    // Removing twice only reports once.
    let gone = world
        .exec(move |tx| tx.remove_entity(first).is_none())
        .expect("open");
    assert!(gone);
    assert_eq!(seen.lock().len(), 3);
}
