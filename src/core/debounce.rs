//! Debouncer - delays an action until a burst of changes has quiesced.
//!
//! Every `schedule()` pushes the deadline out by the full delay, so N changes
//! arriving closer together than the delay produce exactly one firing.
//! The owner polls with `tick()` or sleeps until `deadline()`.

use std::time::{Duration, Instant};

/// Default quiet period before a preview render starts
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    /// When the pending action fires
    pending: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay.as_millis() as u64
    }

    /// (Re)start the timer. A pending firing is pushed back.
    pub fn schedule(&mut self) {
        self.schedule_at(Instant::now());
    }

    fn schedule_at(&mut self, now: Instant) {
        self.pending = Some(now + self.delay);
        log::trace!("Debouncer: fire in {}ms", self.delay.as_millis());
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::trace!("Debouncer: cancelled");
        }
    }

    /// True once the deadline has passed; clears the pending state.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_no_trigger() {
        let mut debouncer = Debouncer::new(100);
        debouncer.schedule();
        assert!(debouncer.is_pending());
        assert!(!debouncer.tick());
    }

    #[test]
    fn test_trigger_after_delay() {
        let mut debouncer = Debouncer::new(10);
        let t0 = Instant::now();
        debouncer.schedule_at(t0);
        assert!(debouncer.tick_at(t0 + Duration::from_millis(15)));
        assert!(!debouncer.is_pending());
        // Fires once only
        assert!(!debouncer.tick_at(t0 + Duration::from_millis(30)));
    }

    #[test]
    fn test_debounce_resets_timer() {
        let mut debouncer = Debouncer::new(50);
        let t0 = Instant::now();
        debouncer.schedule_at(t0);
        debouncer.schedule_at(t0 + Duration::from_millis(30));

        assert!(!debouncer.tick_at(t0 + Duration::from_millis(60)));
        assert!(debouncer.tick_at(t0 + Duration::from_millis(80)));
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::new(0);
        debouncer.schedule();
        debouncer.cancel();
        assert!(debouncer.deadline().is_none());
        assert!(!debouncer.tick());
    }
}
