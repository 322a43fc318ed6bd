//! Configuration for match playback.

use std::time::Duration;

use playback_foundation::Turn;

/// When snapshots enter the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Capture stride turns as playback passes them.
    #[default]
    Lazy,
    /// Capture stride turns as records are ingested, so any seek is at most
    /// one stride of replay away.
    Eager,
}

/// Configuration for a [`Match`](crate::Match).
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Turns between cached snapshots. Never zero.
    pub snapshot_stride: Turn,

    /// When snapshots are captured.
    pub cache_policy: CachePolicy,

    /// Per-frame compute budget used by `compute_frame`.
    pub frame_budget: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            snapshot_stride: 64,
            cache_policy: CachePolicy::Lazy,
            frame_budget: Duration::from_millis(5),
        }
    }
}

impl ReplayConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Few snapshots, for long matches on constrained hosts.
    #[must_use]
    pub fn low_memory() -> Self {
        Self {
            snapshot_stride: 256,
            ..Self::default()
        }
    }

    /// Dense eager snapshots, for scrubbing back and forth.
    #[must_use]
    pub fn fast_seek() -> Self {
        Self {
            snapshot_stride: 16,
            cache_policy: CachePolicy::Eager,
            ..Self::default()
        }
    }

    /// Builder method to set the snapshot stride. Zero is treated as one.
    #[must_use]
    pub fn with_snapshot_stride(mut self, stride: Turn) -> Self {
        self.snapshot_stride = stride.max(1);
        self
    }

    /// Builder method to set the cache policy.
    #[must_use]
    pub const fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Builder method to set the per-frame compute budget.
    #[must_use]
    pub const fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    /// Stride in effect, with a zero set directly on the field clamped to one.
    #[must_use]
    pub fn stride(&self) -> Turn {
        self.snapshot_stride.max(1)
    }
}
