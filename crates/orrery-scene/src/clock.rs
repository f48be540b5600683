//! Simulation time sources.

use std::time::{Duration, Instant};

/// Source of elapsed simulation seconds.
pub trait Clock {
    /// Seconds of simulation time elapsed since the clock started.
    fn elapsed_secs(&self) -> f32;
}

/// Real-time clock with pause and time scaling.
///
/// Time advances at `time_scale` simulated seconds per wall second while
/// running, and freezes while paused.
#[derive(Debug, Clone)]
pub struct SystemClock {
    running_since: Option<Instant>,
    banked: Duration,
    time_scale: f32,
}

impl SystemClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            running_since: Some(Instant::now()),
            banked: Duration::ZERO,
            time_scale,
        }
    }

    pub fn paused(time_scale: f32) -> Self {
        Self {
            running_since: None,
            banked: Duration::ZERO,
            time_scale,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.running_since.is_none()
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.banked += since.elapsed();
        }
    }

    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    fn wall_elapsed(&self) -> Duration {
        self.banked + self.running_since.map_or(Duration::ZERO, |since| since.elapsed())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Clock for SystemClock {
    fn elapsed_secs(&self) -> f32 {
        self.wall_elapsed().as_secs_f32() * self.time_scale
    }
}

/// Deterministic clock advanced by hand, for tests and replays.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualClock {
    seconds: f32,
}

impl ManualClock {
    pub fn at(seconds: f32) -> Self {
        Self { seconds }
    }

    pub fn set(&mut self, seconds: f32) {
        self.seconds = seconds;
    }

    pub fn advance(&mut self, dt: f32) {
        self.seconds += dt;
    }
}

impl Clock for ManualClock {
    fn elapsed_secs(&self) -> f32 {
        self.seconds
    }
}
