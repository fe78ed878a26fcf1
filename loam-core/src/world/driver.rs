//! Thread submitting the tick and janitor transactions at a fixed rate.

use std::{
    io,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, Sender};

use super::{Submitter, tick};

pub(crate) struct Driver {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

impl Driver {
    pub(crate) fn spawn(
        submitter: Submitter,
        name: &str,
        tick_interval: Duration,
        janitor_interval: Duration,
    ) -> io::Result<Self> {
        let (stop, stopped) = channel::bounded::<()>(1);
        let thread = thread::Builder::new()
            .name(format!("{name}-ticker"))
            .spawn(move || {
                let ticker = channel::tick(tick_interval);
                let janitor = channel::tick(janitor_interval);
                loop {
                    // Waiting keeps at most one tick queued; a slow tick delays
                    // the next one instead of piling them up.
                    crossbeam::select! {
                        recv(ticker) -> _ => {
                            if submitter.submit(tick::tick).wait().is_err() {
                                break;
                            }
                        }
                        recv(janitor) -> _ => {
                            let collected = submitter
                                .submit(|tx| tx.state.collect_garbage(tx.shared))
                                .wait();
                            if collected.is_err() {
                                break;
                            }
                        }
                        recv(stopped) -> _ => break,
                    }
                }
            })?;
        Ok(Self { stop, thread })
    }

    /// Asks the thread to stop without waiting for it.
    pub(crate) fn signal_stop(self) {
        let _ = self.stop.try_send(());
    }

    /// Stops the thread and waits until it exited.
    pub(crate) fn stop(self) {
        let _ = self.stop.try_send(());
        if self.thread.join().is_err() {
            log::error!("Tick driver panicked");
        }
    }
}
