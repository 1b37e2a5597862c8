//! Trailing debounce timers
//!
//! The host owns the clock: every call takes the current `Instant`, and the
//! timer fires from [`TrailingDebounce::poll`] once the quiet period has
//! elapsed since the most recent [`schedule`](TrailingDebounce::schedule).

use std::time::{Duration, Instant};

/// Coalesces bursts of events into one trailing action carrying the last payload
#[derive(Debug, Clone)]
pub struct TrailingDebounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> TrailingDebounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Store `payload` and restart the quiet period from `now`
    ///
    /// Any earlier payload is replaced.
    pub fn schedule(&mut self, payload: T, now: Instant) {
        self.pending = Some((payload, now + self.delay));
    }

    /// Take the payload if the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(payload, _)| payload),
            _ => None,
        }
    }

    /// Drop the pending payload without firing
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(payload, _)| payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending payload will fire
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Payload waiting to fire
    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(payload, _)| payload)
    }
}
