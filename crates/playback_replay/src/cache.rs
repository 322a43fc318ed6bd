//! Sparse cache of world snapshots at stride turns.
//!
//! Holds the starting world plus a clone of the world at every multiple of
//! the stride that has been materialized. Entries are never invalidated: the
//! log is append-only, so the world at a turn never changes once known.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use playback_foundation::Turn;
use playback_storage::GameWorld;
use tracing::debug;

/// Stride-spaced snapshots keyed by turn.
#[derive(Clone, Debug)]
pub struct SnapshotCache {
    stride: Turn,
    snapshots: BTreeMap<Turn, Arc<GameWorld>>,
}

impl SnapshotCache {
    /// Creates a cache seeded with the starting world. A zero stride is
    /// treated as one.
    #[must_use]
    pub fn new(initial: Arc<GameWorld>, stride: Turn) -> Self {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(initial.turn(), initial);
        Self {
            stride: stride.max(1),
            snapshots,
        }
    }

    /// Turns between snapshots.
    #[must_use]
    pub const fn stride(&self) -> Turn {
        self.stride
    }

    /// Number of cached snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: the starting world is never evicted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cached turns in ascending order.
    pub fn turns(&self) -> impl Iterator<Item = Turn> + '_ {
        self.snapshots.keys().copied()
    }

    /// Returns true if `turn` is cached.
    #[must_use]
    pub fn contains(&self, turn: Turn) -> bool {
        self.snapshots.contains_key(&turn)
    }

    /// Snapshot at exactly `turn`.
    #[must_use]
    pub fn get(&self, turn: Turn) -> Option<&Arc<GameWorld>> {
        self.snapshots.get(&turn)
    }

    /// Returns true if `turn` is a stride turn not yet cached.
    #[must_use]
    pub fn should_capture(&self, turn: Turn) -> bool {
        turn % self.stride == 0 && !self.contains(turn)
    }

    /// Clones `world` into the cache if its turn is an uncached stride turn.
    /// Returns true if a snapshot was taken.
    pub fn capture(&mut self, world: &GameWorld) -> bool {
        let turn = world.turn();
        if !self.should_capture(turn) {
            return false;
        }
        debug!(turn, bodies = world.body_count(), "captured snapshot");
        self.snapshots.insert(turn, Arc::new(world.clone()));
        true
    }

    /// Greatest cached snapshot at or before `turn`.
    #[must_use]
    pub fn nearest_at_or_before(&self, turn: Turn) -> Option<(Turn, &Arc<GameWorld>)> {
        self.snapshots
            .range(..=turn)
            .next_back()
            .map(|(t, w)| (*t, w))
    }

    /// Greatest cached snapshot in `(after, up_to]`.
    #[must_use]
    pub fn nearest_between(&self, after: Turn, up_to: Turn) -> Option<(Turn, &Arc<GameWorld>)> {
        if up_to <= after {
            return None;
        }
        self.snapshots
            .range((Bound::Excluded(after), Bound::Included(up_to)))
            .next_back()
            .map(|(t, w)| (*t, w))
    }
}
