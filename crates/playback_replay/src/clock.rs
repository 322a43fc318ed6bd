//! Time sources for bounded compute.
//!
//! The match never reads the wall clock directly. `compute` takes a
//! [`Clock`], so tests drive time by hand with [`ManualClock`].

use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&mut self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock.
///
/// Every reading returns the current time and then advances it by `step`,
/// which models a fixed cost per unit of work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualClock {
    now: Duration,
    step: Duration,
}

impl ManualClock {
    /// Creates a stopped clock at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            step: Duration::ZERO,
        }
    }

    /// Builder method to advance the clock by `step` after every reading.
    #[must_use]
    pub const fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Current reading without advancing.
    #[must_use]
    pub const fn peek(&self) -> Duration {
        self.now
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> Duration {
        let now = self.now;
        self.now += self.step;
        now
    }
}
