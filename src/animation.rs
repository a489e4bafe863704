//! Time-driven sprite frame cycling.

use std::time::Instant;

use crate::mask::Sprite;
use crate::timer::Timer;

/// Looping frame sequence that advances at most one frame per step.
#[derive(Clone, Debug)]
pub struct SpriteAnimation {
    timer: Timer,
    frame_secs: f64,
    frames: Vec<Sprite>,
    current: usize,
}

impl SpriteAnimation {
    pub fn new(frames: Vec<Sprite>, frame_secs: f64) -> Self {
        Self { timer: Timer::default(), frame_secs, frames, current: 0 }
    }

    /// Rewind to the first frame and restart the frame timer at `now`.
    pub fn start(&mut self, now: Instant) {
        self.timer.set(now);
        self.current = 0;
    }

    /// Move to the next frame once `frame_secs` has passed since the last
    /// change. Returns whether the frame changed.
    pub fn step(&mut self, now: Instant) -> bool {
        if self.frames.len() < 2 {
            return false;
        }
        match self.timer.elapsed_secs(now) {
            Ok(s) if s >= self.frame_secs => {
                self.timer.set(now);
                self.current = (self.current + 1) % self.frames.len();
                true
            }
            _ => false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Sprite> {
        self.frames.get(self.current)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
