//! Loaders keep the chunks around an observer loaded and show them to its viewer.
//!
//! Every loader operation runs as a weak transaction tied to the loader's
//! [`Validity`]. Closing the loader or moving it to another world invalidates
//! it, so operations queued for a world the loader left never run.

mod strategy;

pub use strategy::{LoadArea, LoadManual, LoadRadius, LoadRegion, LoadStrategy};

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use loam_utils::{ChunkPos, locks::SyncMutex, math::Vector3};
use rustc_hash::FxHashSet;

use crate::world::{Pending, Tx, Validity, Viewer, World, WorldError};

/// Identifies a loader within the worlds it visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoaderId(u64);

impl LoaderId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct LoaderState {
    strategy: Box<dyn LoadStrategy>,
    /// The chunk the loader is centred on.
    pos: ChunkPos,
    /// Positions still to load, closest first.
    queue: VecDeque<ChunkPos>,
    loaded: FxHashSet<ChunkPos>,
    closed: bool,
}

impl LoaderState {
    /// Drops what the strategy no longer wants and rebuilds the queue.
    fn reevaluate(&mut self, tx: &mut Tx<'_>, id: LoaderId) {
        let reference = self.pos;
        let dropped: Vec<ChunkPos> = self
            .loaded
            .iter()
            .copied()
            .filter(|pos| self.strategy.unload(*pos, reference))
            .collect();
        for pos in dropped {
            self.loaded.remove(&pos);
            tx.detach_viewer(pos, id);
        }
        self.queue = self
            .strategy
            .load(reference)
            .into_iter()
            .filter(|pos| !self.loaded.contains(pos))
            .collect();
    }
}

/// Loads chunks around a moving position and shows them to a viewer.
///
/// Chunks are loaded in batches with [`Loader::load`], closest first. Dropping
/// the loader closes it.
pub struct Loader {
    id: LoaderId,
    world: Arc<World>,
    viewer: Arc<dyn Viewer>,
    validity: Validity,
    state: Arc<SyncMutex<LoaderState>>,
}

impl Loader {
    /// Creates a loader at `pos` and registers it in `world`. Nothing is
    /// loaded until [`Loader::load`] is called.
    pub fn new(
        world: &Arc<World>,
        pos: Vector3<f64>,
        strategy: impl LoadStrategy + 'static,
        viewer: Arc<dyn Viewer>,
    ) -> Self {
        let loader = Self {
            id: LoaderId::next(),
            world: Arc::clone(world),
            viewer,
            validity: Validity::new(),
            state: Arc::new(SyncMutex::new(LoaderState {
                strategy: Box::new(strategy),
                pos: ChunkPos::from_vec(pos),
                queue: VecDeque::new(),
                loaded: FxHashSet::default(),
                closed: false,
            })),
        };
        loader.register();
        loader
    }

    fn register(&self) {
        let (id, state, viewer) = (self.id, Arc::clone(&self.state), Arc::clone(&self.viewer));
        // Later operations queue behind this one, so there is nothing to wait for.
        let _ = self.world.submit_weak(&self.validity, move |tx| {
            let mut state = state.lock();
            tx.register_loader(id, state.pos, viewer);
            state.reevaluate(tx, id);
        });
    }

    /// Runs `f` on the loader state in a weak transaction. `None` if it was skipped
    /// or the loader is closed.
    fn exec<R>(
        &self,
        f: impl FnOnce(&mut LoaderState, &mut Tx<'_>, LoaderId) -> R + Send + 'static,
    ) -> Result<Option<R>, WorldError>
    where
        R: Send + 'static,
    {
        let (id, state) = (self.id, Arc::clone(&self.state));
        let result = self.world.exec_weak(&self.validity, move |tx| {
            let mut state = state.lock();
            if state.closed {
                return None;
            }
            Some(f(&mut state, tx, id))
        })?;
        Ok(result.flatten())
    }

    /// The loader's id.
    #[must_use]
    pub fn id(&self) -> LoaderId {
        self.id
    }

    /// The world the loader is in.
    #[must_use]
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// The chunk the loader is centred on.
    #[must_use]
    pub fn position(&self) -> ChunkPos {
        self.state.lock().pos
    }

    /// Chunks currently loaded for this loader.
    #[must_use]
    pub fn loaded(&self) -> Vec<ChunkPos> {
        self.state.lock().loaded.iter().copied().collect()
    }

    /// Chunks still waiting to be loaded, closest first.
    #[must_use]
    pub fn queued(&self) -> Vec<ChunkPos> {
        self.state.lock().queue.iter().copied().collect()
    }

    /// Moves the loader. Chunks the strategy drops are hidden from the viewer
    /// right away; new ones are queued for [`Loader::load`].
    pub fn move_to(&self, pos: Vector3<f64>) -> Result<(), WorldError> {
        let reference = ChunkPos::from_vec(pos);
        self.exec(move |state, tx, id| {
            if state.pos == reference {
                return;
            }
            state.pos = reference;
            tx.move_loader(id, reference);
            state.reevaluate(tx, id);
        })
        .map(|_| ())
    }

    /// Loads up to `n` queued chunks and sends them to the viewer. Returns how many were loaded.
    pub fn load(&self, n: usize) -> Result<usize, WorldError> {
        self.exec(move |state, tx, id| {
            let mut loaded = 0;
            while loaded < n {
                let Some(pos) = state.queue.pop_front() else {
                    break;
                };
                if state.loaded.insert(pos) {
                    tx.attach_viewer(pos, id);
                    loaded += 1;
                }
            }
            loaded
        })
        .map(Option::unwrap_or_default)
    }

    /// Replaces the strategy, dropping and queueing chunks accordingly.
    pub fn change_strategy(&self, strategy: impl LoadStrategy + 'static) -> Result<(), WorldError> {
        self.exec(move |state, tx, id| {
            state.strategy = Box::new(strategy);
            state.reevaluate(tx, id);
        })
        .map(|_| ())
    }

    /// Switches to a [`LoadRadius`] of `radius` chunks.
    pub fn change_radius(&self, radius: i32) -> Result<(), WorldError> {
        self.change_strategy(LoadRadius::new(radius))
    }

    /// Asks the strategy again, for strategies whose answer changes on its own
    /// such as [`LoadManual`].
    pub fn refresh(&self) -> Result<(), WorldError> {
        self.exec(|state, tx, id| state.reevaluate(tx, id)).map(|_| ())
    }

    /// Leaves the current world and registers in `world` at the same position.
    ///
    /// The old world forgets the loader in one transaction before the new one
    /// learns about it.
    pub fn change_world(&mut self, world: &Arc<World>) {
        if Arc::ptr_eq(&self.world, world) {
            return;
        }
        if let Err(err) = self.submit_close().wait() {
            log::debug!("Loader left world {} that was already closed: {err}", self.world.name());
        }
        {
            let mut state = self.state.lock();
            state.loaded.clear();
            state.queue.clear();
            state.closed = false;
        }
        self.validity = Validity::new();
        self.world = Arc::clone(world);
        self.register();
    }

    fn submit_close(&self) -> Pending<()> {
        self.validity.invalidate();
        let (id, state) = (self.id, Arc::clone(&self.state));
        self.world.submit(move |tx| {
            let mut state = state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.queue.clear();
            for pos in state.loaded.drain() {
                tx.detach_viewer(pos, id);
            }
            tx.unregister_loader(id);
        })
    }

    /// Hides every loaded chunk from the viewer and unregisters the loader.
    /// Later operations do nothing.
    pub fn close(&self) -> Result<(), WorldError> {
        self.submit_close().wait()
    }

    /// Whether the loader was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed || !self.validity.is_valid()
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        if self.validity.is_valid() {
            // Never waits, the loader may be dropped inside a transaction.
            let _ = self.submit_close();
        }
    }
}
