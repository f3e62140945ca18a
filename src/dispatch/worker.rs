//! Single-threaded worker draining the invocation queue.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{RegistryError, Result};
use crate::types::{Delivery, Handler};

/// A single deferred callback invocation.
pub(crate) struct Invocation {
    pub handler: Handler,
    pub delivery: Delivery,
}

enum Job {
    Invoke(Invocation),
    /// Replied to once every job queued before it has run.
    Barrier(Sender<()>),
    Shutdown,
}

/// Runs callbacks on a dedicated thread, one at a time, in queue order.
///
/// A panicking callback is caught and logged; it never takes the worker
/// down or blocks delivery to callbacks queued after it.
pub(crate) struct Dispatcher {
    tx: Sender<Job>,
    executed: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, rx) = unbounded::<Job>();
        let executed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&executed);

        let worker = thread::Builder::new()
            .name("herald-dispatch".into())
            .spawn(move || Self::run(rx, counter))
            .expect("failed to spawn dispatch thread");

        Self {
            tx,
            executed,
            worker: Mutex::new(Some(worker)),
        }
    }

    fn run(rx: Receiver<Job>, executed: Arc<AtomicU64>) {
        for job in rx.iter() {
            match job {
                Job::Invoke(invocation) => {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        (invocation.handler)(&invocation.delivery)
                    }));
                    if outcome.is_err() {
                        tracing::warn!(
                            publisher = %invocation.delivery.publisher,
                            event = %invocation.delivery.event,
                            "callback panicked during delivery"
                        );
                    }
                    executed.fetch_add(1, Ordering::SeqCst);
                }
                Job::Barrier(reply) => {
                    // Receiver may have timed out and gone away.
                    let _ = reply.send(());
                }
                Job::Shutdown => break,
            }
        }
    }

    /// Queue a callback invocation for a later turn.
    pub fn dispatch(&self, invocation: Invocation) {
        if self.tx.send(Job::Invoke(invocation)).is_err() {
            tracing::debug!("dispatch after shutdown, delivery dropped");
        }
    }

    /// Number of invocations that have finished running.
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::SeqCst)
    }

    /// Block until every invocation queued before this call has run.
    ///
    /// Invocations queued *while* waiting (e.g. by the callbacks
    /// themselves) are not covered; callers loop until the executed
    /// count stops moving.
    pub fn barrier(&self, timeout: Option<Duration>) -> Result<()> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.tx
            .send(Job::Barrier(reply_tx))
            .map_err(|_| RegistryError::Terminated)?;

        match timeout {
            Some(timeout) => reply_rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => RegistryError::SettleTimeout { timeout },
                RecvTimeoutError::Disconnected => RegistryError::Terminated,
            }),
            None => reply_rx.recv().map_err(|_| RegistryError::Terminated),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Jobs already queued drain first; the marker is FIFO like
        // everything else.
        let _ = self.tx.send(Job::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}
