//! The transaction handle.

use std::{sync::Arc, time::Duration};

use loam_registry::{BlockRegistry, Registry};
use loam_utils::{
    BlockPos, BlockStateId, ChunkPos, Face,
    math::{Aabb, Vector3},
};
use rand::rngs::StdRng;
use smallvec::SmallVec;

use super::{Dimension, Handler, Shared, Viewer, state::WorldState, tick};
use crate::behavior::BlockBehaviours;
use crate::block_entity::BlockEntity;
use crate::chunk::{Column, level_chunk::MAX_LIGHT};
use crate::entity::{Entity, EntityHandle};
use crate::loader::LoaderId;

/// Options for [`Tx::set_block`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOpts {
    /// Skip the neighbour updates around the changed block.
    pub disable_block_updates: bool,
    /// Keep the liquid layer even if the new block can't hold liquid.
    pub disable_liquid_displacement: bool,
}

/// Exclusive access to a world's state for the duration of one transaction.
///
/// Reading or writing a block in a column that isn't cached loads or
/// generates the column first.
pub struct Tx<'w> {
    pub(crate) shared: &'w Shared,
    pub(crate) state: &'w mut WorldState,
}

#[inline]
const fn local(pos: BlockPos) -> (usize, usize) {
    ((pos.x() & 15) as usize, (pos.z() & 15) as usize)
}

impl<'w> Tx<'w> {
    pub(crate) fn new(shared: &'w Shared, state: &'w mut WorldState) -> Self {
        Self { shared, state }
    }

    /// The registries of the world.
    #[must_use]
    pub fn registry(&self) -> &'w Registry {
        &self.shared.registry
    }

    /// The block behaviours of the world.
    #[must_use]
    pub fn behaviours(&self) -> &'w BlockBehaviours {
        &self.shared.behaviours
    }

    /// The world's name.
    #[must_use]
    pub fn name(&self) -> &'w str {
        &self.shared.name
    }

    /// The world's dimension.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.shared.dimension
    }

    /// The lowest and highest block y, inclusive.
    #[must_use]
    pub fn range(&self) -> (i32, i32) {
        self.shared.dimension.range()
    }

    /// The world's random source.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.state.rng
    }

    /// The current event handler.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.state.handler)
    }

    fn in_range(&self, pos: BlockPos) -> bool {
        let (min_y, max_y) = self.range();
        pos.within_height(min_y, max_y)
    }

    pub(crate) fn column(&mut self, pos: ChunkPos) -> &mut Column {
        self.state.column(self.shared, pos)
    }

    /// Whether the column is cached. Never loads it.
    #[must_use]
    pub fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.state.chunks.contains(pos)
    }

    /// Number of cached columns.
    #[must_use]
    pub fn loaded_chunks(&self) -> usize {
        self.state.chunks.len()
    }

    /// The block at `pos`. Positions outside the height range are air.
    pub fn block(&mut self, pos: BlockPos) -> BlockStateId {
        if !self.in_range(pos) {
            return BlockRegistry::AIR;
        }
        let (x, z) = local(pos);
        self.column(pos.chunk_pos()).chunk.block(x, pos.y(), z, 0)
    }

    /// The liquid at `pos`, either on the liquid layer or as the block itself.
    pub fn liquid(&mut self, pos: BlockPos) -> Option<BlockStateId> {
        if !self.in_range(pos) {
            return None;
        }
        let blocks = &self.registry().blocks;
        let (x, z) = local(pos);
        let chunk = &self.column(pos.chunk_pos()).chunk;
        let extra = chunk.block(x, pos.y(), z, 1);
        if extra != BlockRegistry::AIR {
            return Some(extra);
        }
        let block = chunk.block(x, pos.y(), z, 0);
        blocks.data(block).liquid.then_some(block)
    }

    /// Sets the block at `pos`, notifying viewers and, unless disabled, the neighbours.
    ///
    /// Replacing a block drops its block entity. Placing air over a liquid
    /// layer leaves the liquid behind as the block.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockStateId, opts: SetOpts) {
        if !self.in_range(pos) {
            return;
        }
        let behaviours = self.behaviours();
        let (x, z) = local(pos);
        let y = pos.y();
        let column = self.column(pos.chunk_pos());
        if column.chunk.block(x, y, z, 0) == state {
            return;
        }
        let mut block = state;
        let mut extra = None;
        let liquid = column.chunk.block(x, y, z, 1);
        if liquid != BlockRegistry::AIR {
            if state == BlockRegistry::AIR {
                block = liquid;
                extra = Some(BlockRegistry::AIR);
            } else if !opts.disable_liquid_displacement && !behaviours.can_hold_liquid(state) {
                extra = Some(BlockRegistry::AIR);
            }
        }
        column.chunk.set_block(x, y, z, 0, block);
        if let Some(extra) = extra {
            column.chunk.set_block(x, y, z, 1, extra);
        }
        column.modified = true;
        column.block_entities.remove(&pos);
        if let Some(entity) = behaviours.get(block).and_then(|b| b.new_block_entity(block)) {
            column.block_entities.insert(pos, entity);
        }
        for entry in &column.viewers {
            entry.viewer.view_block_update(pos, block, 0);
            if let Some(extra) = extra {
                entry.viewer.view_block_update(pos, extra, 1);
            }
        }
        if !opts.disable_block_updates {
            self.queue_neighbour_updates(pos);
        }
    }

    /// Sets many blocks with the same options. Returns how many were in range.
    pub fn set_blocks(
        &mut self,
        blocks: impl IntoIterator<Item = (BlockPos, BlockStateId)>,
        opts: SetOpts,
    ) -> usize {
        let mut placed = 0;
        for (pos, state) in blocks {
            if self.in_range(pos) {
                self.set_block(pos, state, opts);
                placed += 1;
            }
        }
        placed
    }

    /// Sets or clears the liquid at `pos`.
    ///
    /// A block that can hold liquid keeps its place and gets the liquid on
    /// the liquid layer. Any other block is replaced by the liquid.
    pub fn set_liquid(&mut self, pos: BlockPos, liquid: Option<BlockStateId>) {
        if !self.in_range(pos) {
            return;
        }
        let blocks = &self.registry().blocks;
        let behaviours = self.behaviours();
        if let Some(liquid) = liquid
            && !blocks.data(liquid).liquid
        {
            log::warn!(
                "Ignoring {} set as liquid at {pos}, it is not a liquid",
                blocks.state(liquid)
            );
            return;
        }
        let (x, z) = local(pos);
        let y = pos.y();
        let column = self.column(pos.chunk_pos());
        let block = column.chunk.block(x, y, z, 0);
        let block_is_liquid = blocks.data(block).liquid;
        let (layer_0, layer_1) = match liquid {
            Some(liquid)
                if block != BlockRegistry::AIR
                    && !block_is_liquid
                    && behaviours.can_hold_liquid(block) =>
            {
                (block, liquid)
            }
            Some(liquid) => (liquid, BlockRegistry::AIR),
            None if block_is_liquid => (BlockRegistry::AIR, BlockRegistry::AIR),
            None => (block, BlockRegistry::AIR),
        };
        let before = (block, column.chunk.block(x, y, z, 1));
        if before == (layer_0, layer_1) {
            return;
        }
        column.chunk.set_block(x, y, z, 0, layer_0);
        column.chunk.set_block(x, y, z, 1, layer_1);
        column.modified = true;
        if layer_0 != block {
            column.block_entities.remove(&pos);
        }
        for entry in &column.viewers {
            if layer_0 != before.0 {
                entry.viewer.view_block_update(pos, layer_0, 0);
            }
            if layer_1 != before.1 {
                entry.viewer.view_block_update(pos, layer_1, 1);
            }
        }
        self.queue_neighbour_updates(pos);
    }

    /// Queues a neighbour update for `pos` and each of its six neighbours.
    pub fn queue_neighbour_updates(&mut self, pos: BlockPos) {
        let (min_y, max_y) = self.range();
        let updates = &mut self.state.neighbour_updates;
        updates.push((pos, pos));
        for face in Face::VALUES {
            let side = pos.side(face);
            if side.within_height(min_y, max_y) {
                updates.push((side, pos));
            }
        }
    }

    /// The y of the highest non-air block in a column, or the lowest y if there is none.
    pub fn highest_block(&mut self, x: i32, z: i32) -> i32 {
        let pos = BlockPos::new(x, 0, z);
        let (lx, lz) = local(pos);
        self.column(pos.chunk_pos()).chunk.highest_block(lx, lz)
    }

    /// Sky light reaching `pos`, 0 in dimensions without a sky.
    ///
    /// Above the height range the light is full, below it there is none.
    pub fn sky_light(&mut self, pos: BlockPos) -> u8 {
        if !self.shared.dimension.has_sky() {
            return 0;
        }
        let (min_y, max_y) = self.range();
        if pos.y() > max_y {
            return MAX_LIGHT;
        }
        if pos.y() < min_y {
            return 0;
        }
        let blocks = &self.registry().blocks;
        let (x, z) = local(pos);
        self.column(pos.chunk_pos())
            .chunk
            .sky_light(x, pos.y(), z, blocks)
    }

    /// The brighter of sky and block light at `pos`.
    pub fn light(&mut self, pos: BlockPos) -> u8 {
        let sky = self.sky_light(pos);
        if !self.in_range(pos) {
            return sky;
        }
        let blocks = &self.registry().blocks;
        let (x, z) = local(pos);
        let block = self
            .column(pos.chunk_pos())
            .chunk
            .block_light(x, pos.y(), z, blocks);
        sky.max(block)
    }

    /// The block entity at `pos`.
    pub fn block_entity(&mut self, pos: BlockPos) -> Option<&mut dyn BlockEntity> {
        let column = self.column(pos.chunk_pos());
        let entity = column.block_entities.get_mut(&pos)?;
        column.modified = true;
        Some(entity.as_mut())
    }

    /// Schedules a scheduled tick for the block `state` at `pos` after `delay`.
    ///
    /// The tick only fires if the block is still `state` by then. A delay
    /// shorter than one tick means the next tick. If a tick for the same block
    /// is already due at or after the new target, nothing changes.
    pub fn schedule_block_update(&mut self, pos: BlockPos, state: BlockStateId, delay: Duration) {
        let hash = self.registry().blocks.hash_of(state);
        let current = self.state.settings.current_tick;
        self.state
            .scheduled
            .schedule(pos, hash, current, tick::ticks_of(delay));
    }

    /// The tick at which an update for `state` at `pos` is scheduled.
    #[must_use]
    pub fn scheduled_update(&self, pos: BlockPos, state: BlockStateId) -> Option<u64> {
        let hash = self.registry().blocks.hash_of(state);
        self.state.scheduled.pending(pos, hash)
    }

    /// Adds an entity to the world at its current position.
    pub fn add_entity(&mut self, entity: Box<dyn Entity>) -> EntityHandle {
        let handler = self.handler();
        let chunk = ChunkPos::from_vec(entity.position());
        let (column, entities) = self.state.column_and_entities(self.shared, chunk);
        let handle = entities.insert(entity, chunk);
        column.entities.push(handle);
        column.modified = true;
        if let Some(entity) = entities.get(handle) {
            for entry in &column.viewers {
                entry.viewer.view_entity(handle, entity);
            }
            handler.handle_entity_spawn(handle, entity);
        }
        handle
    }

    /// Removes an entity and returns it.
    ///
    /// An entity removing itself during its own tick is removed once the
    /// tick returns, and `None` is returned.
    pub fn remove_entity(&mut self, handle: EntityHandle) -> Option<Box<dyn Entity>> {
        let entry = self.state.entities.entry_mut(handle)?;
        if entry.entity.is_none() {
            entry.remove_after_tick = true;
            return None;
        }
        let (entity, chunk) = self.state.entities.remove(handle)?;
        if let Some(column) = self.state.chunks.get_mut(chunk) {
            column.remove_entity(handle);
            for entry in &column.viewers {
                entry.viewer.hide_entity(handle);
            }
        }
        self.state
            .handler
            .handle_entity_despawn(handle, entity.as_ref());
        Some(entity)
    }

    /// The entity behind a handle. `None` for removed entities and for an
    /// entity that is currently being ticked.
    #[must_use]
    pub fn entity(&self, handle: EntityHandle) -> Option<&dyn Entity> {
        self.state.entities.get(handle)
    }

    /// Mutable access to an entity. Call [`Tx::update_entity_chunk`] after moving it.
    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut dyn Entity> {
        self.state.entities.get_mut(handle)
    }

    /// Handles of every entity in loaded columns.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityHandle> {
        self.state.entities.handles()
    }

    /// Number of entities in loaded columns.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.state.entities.len()
    }

    /// Handles of the entities whose position is inside `area`.
    #[must_use]
    pub fn entities_within(&self, area: Aabb) -> Vec<EntityHandle> {
        let entities = &self.state.entities;
        entities
            .handles()
            .into_iter()
            .filter(|h| entities.get(*h).is_some_and(|e| area.contains(e.position())))
            .collect()
    }

    /// The column an entity is filed under.
    #[must_use]
    pub fn entity_chunk(&self, handle: EntityHandle) -> Option<ChunkPos> {
        self.state.entities.entry(handle).map(|e| e.chunk)
    }

    /// Files an entity under the column of its current position, showing it
    /// to viewers that gained it and hiding it from viewers that lost it.
    pub fn update_entity_chunk(&mut self, handle: EntityHandle) {
        let Some(entity) = self.state.entities.get(handle) else {
            return;
        };
        let new = ChunkPos::from_vec(entity.position());
        let Some(old) = self.entity_chunk(handle) else {
            return;
        };
        if old == new {
            return;
        }
        let mut lost: SmallVec<[(LoaderId, Arc<dyn Viewer>); 2]> = SmallVec::new();
        if let Some(column) = self.state.chunks.get_mut(old) {
            column.remove_entity(handle);
            lost.extend(
                column
                    .viewers
                    .iter()
                    .map(|v| (v.loader, Arc::clone(&v.viewer))),
            );
        }
        let (column, entities) = self.state.column_and_entities(self.shared, new);
        column.entities.push(handle);
        column.modified = true;
        if let Some(entry) = entities.entry_mut(handle) {
            entry.chunk = new;
        }
        let Some(entity) = entities.get(handle) else {
            return;
        };
        for entry in &column.viewers {
            if let Some(index) = lost.iter().position(|(id, _)| *id == entry.loader) {
                lost.swap_remove(index);
            } else {
                entry.viewer.view_entity(handle, entity);
            }
        }
        for (_, viewer) in lost {
            viewer.hide_entity(handle);
        }
    }

    /// Viewers of the column containing `pos`. Never loads the column.
    #[must_use]
    pub fn viewers(&self, pos: Vector3<f64>) -> Vec<Arc<dyn Viewer>> {
        self.state
            .chunks
            .get(ChunkPos::from_vec(pos))
            .map(|c| c.viewer_list().into_vec())
            .unwrap_or_default()
    }

    pub(crate) fn register_loader(&mut self, id: LoaderId, pos: ChunkPos, viewer: Arc<dyn Viewer>) {
        viewer.view_time(self.state.settings.time);
        viewer.view_weather(self.raining(), self.thundering());
        self.state.register_loader(id, pos, viewer);
    }

    pub(crate) fn move_loader(&mut self, id: LoaderId, pos: ChunkPos) {
        if let Some(loader) = self.state.loaders.get_mut(&id) {
            loader.pos = pos;
        }
    }

    pub(crate) fn unregister_loader(&mut self, id: LoaderId) {
        self.state.loaders.remove(&id);
    }

    /// Loads a column for a loader and sends it, with its entities, to the loader's viewer.
    pub(crate) fn attach_viewer(&mut self, pos: ChunkPos, id: LoaderId) {
        let Some(viewer) = self.state.loaders.get(&id).map(|l| Arc::clone(&l.viewer)) else {
            return;
        };
        let (column, entities) = self.state.column_and_entities(self.shared, pos);
        if !column.add_viewer(id, Arc::clone(&viewer)) {
            return;
        }
        viewer.view_chunk(pos, &column.chunk);
        for handle in &column.entities {
            if let Some(entity) = entities.get(*handle) {
                viewer.view_entity(*handle, entity);
            }
        }
    }

    /// Detaches a loader's viewer from a column, hiding the column's entities from it.
    pub(crate) fn detach_viewer(&mut self, pos: ChunkPos, id: LoaderId) {
        let Some(column) = self.state.chunks.get_mut(pos) else {
            return;
        };
        let Some(viewer) = column.remove_viewer(id) else {
            return;
        };
        for handle in &column.entities {
            viewer.hide_entity(*handle);
        }
    }
}
