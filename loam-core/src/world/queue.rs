//! The transaction queue: the only way into a world's state.
//!
//! Submissions go through an unbounded channel to a single worker thread that
//! owns the [`WorldState`] and runs one callback at a time, in submission
//! order. Normal transactions always run. Weak transactions carry a
//! [`Validity`] that the worker checks right before running them.

use std::{
    future::Future,
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    thread::{self, JoinHandle, ThreadId},
};

use crossbeam::{
    atomic::AtomicCell,
    channel::{self, Receiver, Sender},
};
use futures::{channel::oneshot, executor};

use super::{Shared, Tx, WorldError, state::WorldState};

/// A flag that cancels weak transactions once cleared.
///
/// Clones share the flag. Invalidation is permanent.
#[derive(Debug, Clone, Default)]
pub struct Validity(Arc<AtomicCell<bool>>);

impl Validity {
    /// Creates a valid flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates the flag. Weak transactions not yet started will not run.
    pub fn invalidate(&self) {
        self.0.store(true);
    }

    /// Whether the flag is still valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.load()
    }
}

/// The completion handle of a submitted transaction.
///
/// Resolves to the callback's return value once it ran, or to
/// [`WorldError::Closed`] if the world closed before running it.
#[must_use = "a transaction runs regardless, but its result is lost if the handle is dropped"]
pub struct Pending<R> {
    receiver: oneshot::Receiver<R>,
    worker: ThreadId,
}

impl<R> Pending<R> {
    /// Blocks until the transaction finished.
    ///
    /// # Panics
    /// Panics if called from inside a transaction of the same world, which
    /// would otherwise deadlock.
    pub fn wait(self) -> Result<R, WorldError> {
        assert!(
            thread::current().id() != self.worker,
            "Waiting on a transaction from inside a transaction of the same world would deadlock"
        );
        executor::block_on(self.receiver).map_err(|_| WorldError::Closed)
    }
}

impl<R> Future for Pending<R> {
    type Output = Result<R, WorldError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| WorldError::Closed))
    }
}

pub(crate) trait Work: Send {
    fn run(self: Box<Self>, tx: &mut Tx<'_>);
    fn skip(self: Box<Self>);
}

struct Normal<F, R> {
    callback: F,
    done: oneshot::Sender<R>,
}

impl<F, R> Work for Normal<F, R>
where
    F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send,
    R: Send,
{
    fn run(self: Box<Self>, tx: &mut Tx<'_>) {
        let this = *self;
        // The caller may have dropped its handle.
        let _ = this.done.send((this.callback)(tx));
    }

    fn skip(self: Box<Self>) {}
}

struct Weak<F, R> {
    callback: F,
    done: oneshot::Sender<Option<R>>,
}

impl<F, R> Work for Weak<F, R>
where
    F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send,
    R: Send,
{
    fn run(self: Box<Self>, tx: &mut Tx<'_>) {
        let this = *self;
        let _ = this.done.send(Some((this.callback)(tx)));
    }

    fn skip(self: Box<Self>) {
        let _ = self.done.send(None);
    }
}

pub(crate) enum Job {
    Run {
        validity: Option<Validity>,
        work: Box<dyn Work>,
    },
    Close(oneshot::Sender<()>),
}

/// Cheap handle for putting jobs on a world's queue.
#[derive(Clone)]
pub(crate) struct Submitter {
    sender: Sender<Job>,
    worker: ThreadId,
}

impl Submitter {
    fn push<R>(&self, job: Job, receiver: oneshot::Receiver<R>) -> Pending<R> {
        // A failed send drops the job and with it the completion sender, so
        // the handle resolves to `Closed`.
        let _ = self.sender.send(job);
        Pending {
            receiver,
            worker: self.worker,
        }
    }

    pub(crate) fn submit<F, R>(&self, callback: F) -> Pending<R>
    where
        F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done, receiver) = oneshot::channel();
        let job = Job::Run {
            validity: None,
            work: Box::new(Normal { callback, done }),
        };
        self.push(job, receiver)
    }

    pub(crate) fn submit_weak<F, R>(&self, validity: &Validity, callback: F) -> Pending<Option<R>>
    where
        F: for<'a> FnOnce(&mut Tx<'a>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done, receiver) = oneshot::channel();
        let job = Job::Run {
            validity: Some(validity.clone()),
            work: Box::new(Weak { callback, done }),
        };
        self.push(job, receiver)
    }

    pub(crate) fn close(&self) -> Pending<()> {
        let (done, receiver) = oneshot::channel();
        self.push(Job::Close(done), receiver)
    }

    pub(crate) fn is_worker(&self) -> bool {
        thread::current().id() == self.worker
    }
}

/// Starts the worker thread that owns `state`.
pub(crate) fn spawn_worker(
    shared: Arc<Shared>,
    state: WorldState,
) -> io::Result<(Submitter, JoinHandle<()>)> {
    let (sender, receiver) = channel::unbounded();
    let handle = thread::Builder::new()
        .name(format!("{}-worker", shared.name))
        .spawn(move || run_worker(&shared, state, &receiver))?;
    let worker = handle.thread().id();
    Ok((Submitter { sender, worker }, handle))
}

fn run_worker(shared: &Shared, mut state: WorldState, receiver: &Receiver<Job>) {
    for job in receiver {
        match job {
            Job::Run { validity, work } => {
                if validity.is_some_and(|v| !v.is_valid()) {
                    work.skip();
                    continue;
                }
                let mut tx = Tx::new(shared, &mut state);
                work.run(&mut tx);
                state.publish_settings(shared);
            }
            Job::Close(done) => {
                state.close(shared);
                let _ = done.send(());
                return;
            }
        }
    }
    // Every submitter is gone without an explicit close.
    state.close(shared);
}
