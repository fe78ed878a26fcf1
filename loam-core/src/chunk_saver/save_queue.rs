//! Background column writer.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam::channel::{self, Sender};
use loam_utils::{ChunkPos, locks::SyncMutex};
use rustc_hash::FxHashMap;

use super::Provider;
use crate::chunk::ColumnData;
use crate::world::Dimension;

type InFlight = Arc<SyncMutex<FxHashMap<ChunkPos, Arc<ColumnData>>>>;

/// Writes columns to the provider on a dedicated thread.
///
/// A column stays in the in-flight map until its write finished, so a reload
/// racing the write still sees the latest data.
pub(crate) struct SaveQueue {
    sender: SyncMutex<Option<Sender<(ChunkPos, Arc<ColumnData>)>>>,
    in_flight: InFlight,
    thread: SyncMutex<Option<JoinHandle<()>>>,
}

impl SaveQueue {
    pub(crate) fn spawn(
        provider: Arc<dyn Provider>,
        dimension: Dimension,
        world_name: &str,
    ) -> io::Result<Self> {
        let (sender, receiver) = channel::unbounded::<(ChunkPos, Arc<ColumnData>)>();
        let in_flight: InFlight = Arc::default();
        let thread_in_flight = Arc::clone(&in_flight);
        let thread = thread::Builder::new()
            .name(format!("{world_name}-saver"))
            .spawn(move || {
                for (pos, data) in receiver {
                    if let Err(err) = provider.store_column(pos, dimension, &data) {
                        log::warn!("Failed to save chunk {pos}: {err}");
                    }
                    let mut in_flight = thread_in_flight.lock();
                    if in_flight.get(&pos).is_some_and(|d| Arc::ptr_eq(d, &data)) {
                        in_flight.remove(&pos);
                    }
                }
            })?;
        Ok(Self {
            sender: SyncMutex::new(Some(sender)),
            in_flight,
            thread: SyncMutex::new(Some(thread)),
        })
    }

    /// Queues a column for writing, superseding any queued data for the same position.
    pub(crate) fn enqueue(&self, pos: ChunkPos, data: ColumnData) {
        let data = Arc::new(data);
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            log::warn!("Chunk {pos} saved after the save queue was flushed, dropping it");
            return;
        };
        self.in_flight.lock().insert(pos, Arc::clone(&data));
        if sender.send((pos, data)).is_err() {
            log::warn!("Save thread is gone, chunk {pos} was not saved");
            self.in_flight.lock().remove(&pos);
        }
    }

    /// The data of a column that is queued but not written yet.
    pub(crate) fn in_flight(&self, pos: ChunkPos) -> Option<Arc<ColumnData>> {
        self.in_flight.lock().get(&pos).cloned()
    }

    /// Number of queued writes.
    pub(crate) fn pending(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Writes everything queued and stops the thread. Later enqueues are dropped.
    pub(crate) fn flush(&self) {
        drop(self.sender.lock().take());
        if let Some(thread) = self.thread.lock().take()
            && thread.join().is_err()
        {
            log::error!("Save thread panicked, some chunks may not have been saved");
        }
    }
}

impl Drop for SaveQueue {
    fn drop(&mut self) {
        self.flush();
    }
}
