//! Single-flight deferred work.
//!
//! At most one value is pending at a time. Scheduling again before the
//! deadline replaces the pending value and restarts the delay, so a burst
//! of events collapses into one delivery carrying the latest value.

use std::time::{Duration, Instant};

/// A deadline-driven slot holding the latest scheduled value.
#[derive(Debug, Clone)]
pub struct SingleFlight<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> SingleFlight<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `value` for `now + delay`, replacing anything pending.
    ///
    /// Returns `true` when a pending value was superseded.
    pub fn schedule(&mut self, value: T, now: Instant) -> bool {
        let replaced = self.pending.is_some();
        self.pending = Some((now + self.delay, value));
        replaced
    }

    /// Drop the pending value without delivering it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Take the pending value once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.cancel(),
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
