use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::error::{SimError, SimResult};

/// Source of monotonic time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Copy, Clone, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used for replays and tests.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// A remembered instant. Starts unset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    mark: Option<Instant>,
}

impl Timer {
    pub fn started(now: Instant) -> Self {
        Self { mark: Some(now) }
    }

    pub fn set(&mut self, now: Instant) {
        self.mark = Some(now);
    }

    pub fn clear(&mut self) {
        self.mark = None;
    }

    pub fn is_set(&self) -> bool {
        self.mark.is_some()
    }

    /// Signed seconds from the mark to `now`; negative if `now` is earlier.
    pub fn elapsed_secs(&self, now: Instant) -> SimResult<f64> {
        let mark = self.mark.ok_or(SimError::TimerUnset)?;
        Ok(signed_secs(now, mark))
    }

    pub fn elapsed_millis(&self, now: Instant) -> SimResult<f64> {
        self.elapsed_secs(now).map(|s| s * 1000.0)
    }

    /// Signed seconds from `b`'s mark to `a`'s mark.
    pub fn delta(a: &Timer, b: &Timer) -> SimResult<f64> {
        match (a.mark, b.mark) {
            (Some(ta), Some(tb)) => Ok(signed_secs(ta, tb)),
            _ => Err(SimError::TimerUnset),
        }
    }
}

fn signed_secs(later: Instant, earlier: Instant) -> f64 {
    match later.checked_duration_since(earlier) {
        Some(d) => d.as_secs_f64(),
        None => -earlier.duration_since(later).as_secs_f64(),
    }
}
