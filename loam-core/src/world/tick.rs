//! The per tick transaction.

use std::{mem, time::Duration};

use loam_registry::BlockRegistry;
use loam_utils::{
    BlockPos, BlockStateId, ChunkPos, SUB_CHUNK_SIZE,
    math::{Aabb, Vector3},
};
use rand::Rng;

use super::{Sound, Tx, weather};
use crate::entity::{EntityHandle, Lightning};
use crate::ticks::ScheduledTick;

/// Length of one tick of world time.
pub(crate) const TICK_MILLIS: u128 = 50;
/// Time and weather are pushed to viewers every this many ticks.
const SYNC_INTERVAL: u64 = 20;
/// One in this many loaded chunks is struck per tick while thundering.
const LIGHTNING_CHANCE: u32 = 100_000;
/// How far a strike looks for a living entity to hit instead of the ground.
const LIGHTNING_REDIRECT_RANGE: f64 = 3.0;

/// Converts a duration to whole ticks, rounding down.
pub(crate) fn ticks_of(duration: Duration) -> u64 {
    (duration.as_millis() / TICK_MILLIS) as u64
}

/// Runs one tick.
///
/// A world nobody looks at only advances its counter once and then stays
/// still until a loader registers.
pub(crate) fn tick(tx: &mut Tx<'_>) {
    if tx.state.loaders.is_empty() && tx.state.settings.current_tick != 0 {
        return;
    }
    let span = tracing::trace_span!(
        "tick",
        world = tx.name(),
        tick = tx.state.settings.current_tick + 1
    );
    let _enter = span.enter();

    let weather_changed = advance(tx);
    let current_tick = tx.state.settings.current_tick;
    if weather_changed {
        tx.broadcast_weather();
    }
    if current_tick % SYNC_INTERVAL == 0 {
        tx.broadcast_time();
        if !weather_changed {
            tx.broadcast_weather();
        }
    }

    strike_lightning(tx);
    tick_entities(tx);
    scheduled_ticks(tx, current_tick);
    neighbour_updates(tx);
    random_ticks(tx);
}

/// Advances the counter, the time of day and the weather. Returns whether the weather changed.
fn advance(tx: &mut Tx<'_>) -> bool {
    let has_weather = tx.dimension().has_weather();
    let state = &mut *tx.state;
    state.settings_dirty = true;
    let settings = &mut state.settings;
    settings.current_tick += 1;
    if settings.time_cycle {
        settings.time += 1;
    }
    if has_weather && settings.weather_cycle {
        weather::advance(settings, &mut state.rng)
    } else {
        false
    }
}

fn strike_lightning(tx: &mut Tx<'_>) {
    if !tx.dimension().has_weather() || !tx.thundering() {
        return;
    }
    let positions: Vec<ChunkPos> = tx.state.chunks.positions().to_vec();
    for chunk in positions {
        if tx.state.rng.random_range(0..LIGHTNING_CHANCE) == 0 {
            strike(tx, chunk);
        }
    }
}

/// Strikes a random column of `chunk`, or a sky exposed living entity close to it.
/// Returns where the bolt landed.
fn strike(tx: &mut Tx<'_>, chunk: ChunkPos) -> Vector3<f64> {
    let x = chunk.x() * SUB_CHUNK_SIZE + tx.state.rng.random_range(0..SUB_CHUNK_SIZE);
    let z = chunk.z() * SUB_CHUNK_SIZE + tx.state.rng.random_range(0..SUB_CHUNK_SIZE);
    let y = tx.highest_block(x, z) + 1;
    let mut target = BlockPos::new(x, y, z).bottom_center();

    let area = Aabb::new(target, target).grow(LIGHTNING_REDIRECT_RANGE);
    let candidates: Vec<Vector3<f64>> = tx
        .entities_within(area)
        .into_iter()
        .filter_map(|h| tx.entity(h))
        .filter(|e| e.is_living())
        .map(|e| e.position())
        .collect();
    let exposed: Vec<Vector3<f64>> = candidates
        .into_iter()
        .filter(|pos| {
            let feet = BlockPos::from_vec(*pos);
            tx.highest_block(feet.x(), feet.z()) < feet.y()
        })
        .collect();
    if !exposed.is_empty() {
        target = exposed[tx.state.rng.random_range(0..exposed.len())];
    }

    log::debug!("Lightning strikes {} at {}", tx.name(), BlockPos::from_vec(target));
    tx.add_entity(Box::new(Lightning::new(target)));
    tx.play_sound(target, Sound::THUNDER);
    target
}

/// Ticks the entities of every viewed column.
fn tick_entities(tx: &mut Tx<'_>) {
    let handles: Vec<EntityHandle> = tx
        .state
        .chunks
        .iter()
        .filter(|(_, c)| !c.viewers.is_empty())
        .flat_map(|(_, c)| c.entities.iter().copied())
        .collect();
    for handle in handles {
        let Some(mut entity) = tx.state.entities.take(handle) else {
            continue;
        };
        let before = (entity.position(), entity.rotation());
        entity.tick(tx, handle);
        let after = (entity.position(), entity.rotation());
        if tx.state.entities.put_back(handle, entity) {
            tx.remove_entity(handle);
            continue;
        }
        if before == after {
            continue;
        }
        tx.update_entity_chunk(handle);
        for viewer in tx.viewers(after.0) {
            viewer.view_entity_movement(handle, after.0, after.1);
        }
    }
}

fn scheduled_ticks(tx: &mut Tx<'_>, current_tick: u64) {
    let behaviours = tx.behaviours();
    let blocks = &tx.registry().blocks;
    let due: Vec<ScheduledTick> = tx.state.scheduled.drain_due(current_tick);
    for tick in due {
        let block = tx.block(tick.pos);
        let state = if blocks.hash_of(block) == tick.hash {
            Some(block)
        } else {
            tx.liquid(tick.pos)
                .filter(|liquid| blocks.hash_of(*liquid) == tick.hash)
        };
        let Some(state) = state else {
            continue;
        };
        if let Some(ticker) = behaviours.get(state).and_then(|b| b.as_scheduled_ticker()) {
            ticker.scheduled_tick(tx, tick.pos, state);
        }
    }
}

/// Runs the neighbour updates queued before this tick. Updates queued while
/// running them wait for the next tick.
fn neighbour_updates(tx: &mut Tx<'_>) {
    let behaviours = tx.behaviours();
    let updates = mem::take(&mut tx.state.neighbour_updates);
    for (pos, changed) in updates {
        if !tx.is_chunk_loaded(pos.chunk_pos()) {
            continue;
        }
        let block = tx.block(pos);
        if let Some(ticker) = behaviours
            .get(block)
            .and_then(|b| b.as_neighbour_update_ticker())
        {
            ticker.neighbour_update_tick(tx, pos, changed, block);
        }
        if let Some(liquid) = tx.liquid(pos)
            && liquid != block
            && let Some(ticker) = behaviours
                .get(liquid)
                .and_then(|b| b.as_neighbour_update_ticker())
        {
            ticker.neighbour_update_tick(tx, pos, changed, liquid);
        }
    }
}

/// Random ticks blocks and ticks block entities in chunks near a loader.
fn random_ticks(tx: &mut Tx<'_>) {
    let behaviours = tx.behaviours();
    let speed = tx.state.settings.random_tick_speed;
    let range = i64::from(tx.state.settings.tick_range);
    let range_squared = range * range;
    let loaders: Vec<ChunkPos> = tx.state.loaders.values().map(|l| l.pos).collect();

    let mut targets: Vec<(BlockPos, BlockStateId)> = Vec::new();
    let mut block_entities: Vec<BlockPos> = Vec::new();
    let state = &mut *tx.state;
    for (pos, column) in state.chunks.iter() {
        if !loaders
            .iter()
            .any(|l| l.distance_squared(pos) <= range_squared)
        {
            continue;
        }
        block_entities.extend(column.block_entities.keys().copied());
        if speed == 0 {
            continue;
        }
        for (index, section) in column.chunk.sections().iter().enumerate() {
            if !section.has_blocks() {
                continue;
            }
            let base_y = column.chunk.section_min_y(index);
            for _ in 0..speed {
                let r: u32 = state.rng.random();
                let (x, y, z) = (r & 15, (r >> 4) & 15, (r >> 8) & 15);
                let block = section.get(x as usize, y as usize, z as usize, 0);
                if behaviours.random_ticks(block) {
                    targets.push((
                        BlockPos::new(
                            pos.x() * SUB_CHUNK_SIZE + x as i32,
                            base_y + y as i32,
                            pos.z() * SUB_CHUNK_SIZE + z as i32,
                        ),
                        block,
                    ));
                }
            }
        }
    }

    for (pos, block) in targets {
        // An earlier random tick this tick may have changed it.
        if tx.block(pos) != block {
            continue;
        }
        if let Some(ticker) = behaviours.get(block).and_then(|b| b.as_random_ticker()) {
            ticker.random_tick(tx, pos, block);
        }
    }
    for pos in block_entities {
        tick_block_entity(tx, pos);
    }
}

fn tick_block_entity(tx: &mut Tx<'_>, pos: BlockPos) {
    let chunk = pos.chunk_pos();
    let (x, z) = ((pos.x() & 15) as usize, (pos.z() & 15) as usize);
    let Some(column) = tx.state.chunks.get_mut(chunk) else {
        return;
    };
    let Some(mut entity) = column.block_entities.remove(&pos) else {
        return;
    };
    let block = column.chunk.block(x, pos.y(), z, 0);
    entity.tick(tx, pos);
    // The block entity goes back unless its block was replaced while it ticked.
    if let Some(column) = tx.state.chunks.get_mut(chunk)
        && column.chunk.block(x, pos.y(), z, 0) == block
        && block != BlockRegistry::AIR
    {
        column.block_entities.entry(pos).or_insert(entity);
    }
}
