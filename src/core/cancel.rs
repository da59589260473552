//! Cooperative cancellation flag shared between the scheduler and a render job.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set once by the owner of a superseded request; checked by the job at its
/// resumption points. Never interrupts work already in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
