//! Thread pool for render jobs (frame capture + filter invocations).
//!
//! Uses a crossbeam MPMC queue with closure-based task execution.
//! Jobs tied to a [`CancelToken`] are dropped at dequeue time if their
//! request was superseded while they waited.

use crossbeam_channel::{Sender, unbounded};
use log::{debug, error};
use std::thread;

use crate::core::cancel::CancelToken;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool for blocking render work.
///
/// Each preview request becomes one job; several can run at once so a slow,
/// superseded render never delays the latest one.
pub struct Workers {
    sender: Option<Sender<Job>>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl Workers {
    /// Spawn `num_threads` workers (at least one).
    pub fn new(num_threads: usize) -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let mut handles = Vec::new();

        for worker_id in 0..num_threads.max(1) {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("livegrade-worker-{}", worker_id))
                .spawn(move || {
                    debug!("Worker {} started", worker_id);
                    while let Ok(job) = rx.recv() {
                        // A panicking job must not take the worker down with it
                        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
                            error!("Worker {} job panicked", worker_id);
                        }
                    }
                    debug!("Worker {} stopped", worker_id);
                })?;
            handles.push(handle);
        }

        debug!("Workers initialized: {} threads", handles.len());

        Ok(Self {
            sender: Some(tx),
            handles,
        })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Execute closure on a worker thread.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(e) = sender.send(Box::new(f)) {
            error!("Failed to enqueue job: {}", e);
        }
    }

    /// Execute closure unless `token` is cancelled by the time a worker picks it up.
    pub fn execute_cancellable<F>(&self, token: CancelToken, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(move || {
            if token.is_cancelled() {
                debug!("Skipping superseded job");
                return;
            }
            f();
        });
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        debug!("Workers shutting down ({} threads)...", self.handles.len());
        // Closing the channel ends every recv() loop once queued jobs drain
        drop(self.sender.take());
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("Worker thread panicked");
            }
        }
    }
}
