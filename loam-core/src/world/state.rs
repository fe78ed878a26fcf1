//! State owned by the worker thread, plus column loading and saving.

use std::sync::Arc;

use loam_utils::{BlockPos, ChunkPos};
use rand::rngs::StdRng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::{Handler, Settings, Shared, Viewer};
use crate::chunk::{
    BlockEntityData, Column, ColumnData, EntityData, LevelChunk, cache::ChunkCache, codec,
};
use crate::entity::EntityArena;
use crate::loader::LoaderId;
use crate::ticks::ScheduledTickQueue;

/// A loader registered in a world.
pub(crate) struct LoaderEntry {
    /// The chunk the loader is centred on.
    pub(crate) pos: ChunkPos,
    pub(crate) viewer: Arc<dyn Viewer>,
}

pub(crate) struct WorldState {
    pub(crate) settings: Settings,
    /// Set when `settings` changed since the last published snapshot.
    pub(crate) settings_dirty: bool,
    pub(crate) chunks: ChunkCache,
    pub(crate) entities: EntityArena,
    pub(crate) scheduled: ScheduledTickQueue,
    /// Pending neighbour updates as (position to update, position that changed).
    pub(crate) neighbour_updates: Vec<(BlockPos, BlockPos)>,
    pub(crate) loaders: FxHashMap<LoaderId, LoaderEntry>,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) rng: StdRng,
    closed: bool,
}

impl WorldState {
    pub(crate) fn new(settings: Settings, rng: StdRng, handler: Arc<dyn Handler>) -> Self {
        Self {
            settings,
            settings_dirty: false,
            chunks: ChunkCache::new(),
            entities: EntityArena::new(),
            scheduled: ScheduledTickQueue::default(),
            neighbour_updates: Vec::new(),
            loaders: FxHashMap::default(),
            handler,
            rng,
            closed: false,
        }
    }

    pub(crate) fn settings_mut(&mut self) -> &mut Settings {
        self.settings_dirty = true;
        &mut self.settings
    }

    /// Publishes the settings to outside readers if they changed.
    pub(crate) fn publish_settings(&mut self, shared: &Shared) {
        if self.settings_dirty {
            self.settings_dirty = false;
            shared.settings.store(Arc::new(self.settings.clone()));
        }
    }

    /// The column at `pos`, loading or generating it if needed.
    pub(crate) fn column(&mut self, shared: &Shared, pos: ChunkPos) -> &mut Column {
        self.column_and_entities(shared, pos).0
    }

    /// Like [`WorldState::column`], also handing out the entity arena.
    pub(crate) fn column_and_entities(
        &mut self,
        shared: &Shared,
        pos: ChunkPos,
    ) -> (&mut Column, &mut EntityArena) {
        let Self {
            chunks, entities, ..
        } = self;
        let column = chunks.get_or_insert_with(pos, || load_column(shared, entities, pos));
        (column, entities)
    }

    pub(crate) fn register_loader(&mut self, id: LoaderId, pos: ChunkPos, viewer: Arc<dyn Viewer>) {
        self.loaders.insert(id, LoaderEntry { pos, viewer });
    }

    /// Removes a column from the cache, queueing it for saving.
    pub(crate) fn evict(&mut self, shared: &Shared, pos: ChunkPos) -> bool {
        let Some(column) = self.chunks.remove(pos) else {
            return false;
        };
        if !shared.read_only && needs_save(&column) {
            shared
                .saver
                .enqueue(pos, encode_column(shared, &column, &self.entities));
        }
        for handle in column.entities {
            self.entities.remove(handle);
        }
        true
    }

    /// Evicts every column without viewers. Returns how many were evicted.
    pub(crate) fn collect_garbage(&mut self, shared: &Shared) -> usize {
        let span = tracing::debug_span!("janitor", world = %shared.name);
        let _enter = span.enter();
        let unused: Vec<ChunkPos> = self
            .chunks
            .iter()
            .filter(|(_, c)| c.viewers.is_empty())
            .map(|(pos, _)| pos)
            .collect();
        for pos in &unused {
            self.evict(shared, *pos);
        }
        log::debug!(
            "Janitor evicted {} columns from {}, {} still loaded, {} entities, {} saves queued",
            unused.len(),
            shared.name,
            self.chunks.len(),
            self.entities.len(),
            shared.saver.pending()
        );
        unused.len()
    }

    /// Queues every column that changed for saving, keeping them loaded.
    /// Returns how many were queued.
    pub(crate) fn save_all(&mut self, shared: &Shared) -> usize {
        if shared.read_only {
            return 0;
        }
        let entities = &self.entities;
        let dirty: Vec<(ChunkPos, &Column)> =
            self.chunks.iter().filter(|(_, c)| needs_save(c)).collect();
        let encoded: Vec<(ChunkPos, ColumnData)> = dirty
            .par_iter()
            .map(|(pos, column)| (*pos, encode_column(shared, column, entities)))
            .collect();
        let saved = encoded.len();
        for (pos, data) in encoded {
            shared.saver.enqueue(pos, data);
        }
        for (_, column) in self.chunks.iter_mut() {
            column.modified = false;
        }
        saved
    }

    pub(crate) fn save_settings(&self, shared: &Shared) {
        if shared.read_only {
            return;
        }
        if let Err(err) = shared.provider.save_settings(&self.settings) {
            log::warn!("Failed to save settings of world {}: {err}", shared.name);
        }
    }

    /// Saves everything and releases the provider. Runs once, as the last job of the worker.
    pub(crate) fn close(&mut self, shared: &Shared) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.handler.handle_close();
        let saved = self.save_all(shared);
        self.save_settings(shared);
        shared.saver.flush();
        if let Err(err) = shared.provider.close() {
            log::warn!("Failed to close provider of world {}: {err}", shared.name);
        }
        self.loaders.clear();
        self.chunks = ChunkCache::new();
        self.entities = EntityArena::new();
        self.publish_settings(shared);
        log::info!("Closed world {}, saved {saved} columns", shared.name);
    }
}

/// Whether a column may differ from what the provider has. Entities and
/// block entities change without marking their column.
fn needs_save(column: &Column) -> bool {
    column.modified || !column.entities.is_empty() || !column.block_entities.is_empty()
}

/// Builds a column from the save queue, the provider or the generator, in that order.
fn load_column(shared: &Shared, entities: &mut EntityArena, pos: ChunkPos) -> Column {
    let stored = shared.saver.in_flight(pos).or_else(|| {
        match shared.provider.load_column(pos, shared.dimension) {
            Ok(data) => data.map(Arc::new),
            Err(err) => {
                log::warn!("Failed to load chunk {pos} of {}: {err}", shared.name);
                None
            }
        }
    });
    if let Some(data) = stored {
        return decode_column(shared, entities, pos, &data);
    }
    let (min_y, max_y) = shared.dimension.range();
    let mut chunk = LevelChunk::new(min_y, max_y);
    shared.generator.generate(pos, &mut chunk);
    let mut column = Column::new(chunk);
    column.modified = true;
    column
}

fn decode_column(
    shared: &Shared,
    entities: &mut EntityArena,
    pos: ChunkPos,
    data: &ColumnData,
) -> Column {
    let (min_y, max_y) = shared.dimension.range();
    let chunk = codec::decode_chunk(&data.sub_chunks, min_y, max_y, &shared.registry.blocks);
    let mut column = Column::new(chunk);
    for saved in &data.block_entities {
        let at = saved.pos;
        if at.chunk_pos() != pos {
            log::warn!("Block entity at {at} stored in chunk {pos}, dropping it");
            continue;
        }
        let block = column
            .chunk
            .block((at.x() & 15) as usize, at.y(), (at.z() & 15) as usize, 0);
        match shared
            .behaviours
            .get(block)
            .and_then(|b| b.load_block_entity(&saved.data))
        {
            Some(entity) => {
                column.block_entities.insert(at, entity);
            }
            None => log::warn!("Failed to load block entity at {at}, dropping it"),
        }
    }
    for saved in &data.entities {
        if let Some(entity) = shared.entity_types.decode(&saved.kind, &saved.data) {
            column.entities.push(entities.insert(entity, pos));
        }
    }
    column
}

fn encode_column(shared: &Shared, column: &Column, entities: &EntityArena) -> ColumnData {
    let block_entities = column
        .block_entities
        .iter()
        .map(|(pos, entity)| BlockEntityData {
            pos: *pos,
            data: entity.save(),
        })
        .collect();
    let entities = column
        .entities
        .iter()
        .filter_map(|handle| entities.get(*handle))
        .filter_map(|entity| {
            entity.save().map(|data| EntityData {
                kind: entity.kind().clone(),
                data,
            })
        })
        .collect();
    ColumnData {
        sub_chunks: codec::encode_chunk(&column.chunk, &shared.registry.blocks),
        block_entities,
        entities,
    }
}
