use std::time::{Duration, Instant};

use crate::timer::Timer;

const HISTORY: usize = 10;

/// Fixed frame budget plus a rolling average of recent frame lengths.
///
/// The pacer never sleeps itself; `finish` tells the host loop how long it
/// may wait before starting the next frame.
#[derive(Clone, Debug)]
pub struct FramePacer {
    target_fps: f64,
    frame_start: Timer,
    history: [f64; HISTORY],
    average_ms: f64,
}

impl FramePacer {
    pub fn new(target_fps: f64) -> Self {
        Self { target_fps, frame_start: Timer::default(), history: [0.0; HISTORY], average_ms: 0.0 }
    }

    /// Milliseconds one frame may take.
    pub fn budget_ms(&self) -> f64 {
        if self.target_fps > 0.0 { 1000.0 / self.target_fps } else { 0.0 }
    }

    pub fn begin(&mut self, now: Instant) {
        self.frame_start.set(now);
    }

    /// Time left in the current frame's budget, zero once it is spent.
    /// Unstarted frames get the whole budget.
    pub fn finish(&self, now: Instant) -> Duration {
        let spent = self.frame_start.elapsed_millis(now).unwrap_or(0.0).max(0.0);
        let left = self.budget_ms() - spent;
        if left > 0.0 { Duration::from_secs_f64(left / 1000.0) } else { Duration::ZERO }
    }

    /// Push one frame length into the history and return the new average.
    pub fn record(&mut self, frame_ms: f64) -> f64 {
        self.history.rotate_left(1);
        self.history[HISTORY - 1] = frame_ms;
        self.average_ms = self.history.iter().sum::<f64>() / HISTORY as f64;
        self.average_ms
    }

    pub fn average_ms(&self) -> f64 {
        self.average_ms
    }

    pub fn fps(&self) -> f64 {
        if self.average_ms > 0.0 { 1000.0 / self.average_ms } else { 0.0 }
    }
}
