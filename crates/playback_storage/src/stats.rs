//! Per-team aggregate statistics.

use std::collections::BTreeMap;
use std::fmt;

use playback_foundation::BodyTypeId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scalar team statistic set directly by delta records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TeamStat {
    /// Votes won so far.
    Votes,
    /// Current bid.
    Bid,
    /// Income per turn.
    Income,
    /// Active buff count.
    Buffs,
}

impl fmt::Display for TeamStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Votes => write!(f, "votes"),
            Self::Bid => write!(f, "bid"),
            Self::Income => write!(f, "income"),
            Self::Buffs => write!(f, "buffs"),
        }
    }
}

/// Aggregates for one team.
///
/// Body counts are maintained by the world as bodies spawn, die, or change
/// team or type. The scalar stats are whatever the last delta set them to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeamStats {
    body_counts: BTreeMap<BodyTypeId, u32>,
    votes: i32,
    bid: i32,
    income: i32,
    buffs: i32,
}

impl TeamStats {
    /// Creates zeroed stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies of a type.
    #[must_use]
    pub fn count(&self, body_type: BodyTypeId) -> u32 {
        self.body_counts.get(&body_type).copied().unwrap_or(0)
    }

    /// Number of live bodies of every type.
    #[must_use]
    pub fn total_bodies(&self) -> u32 {
        self.body_counts.values().sum()
    }

    /// Iterates `(type, count)` pairs with a non-zero count.
    pub fn counts(&self) -> impl Iterator<Item = (BodyTypeId, u32)> + '_ {
        self.body_counts.iter().map(|(ty, n)| (*ty, *n))
    }

    /// Reads a scalar stat.
    #[must_use]
    pub const fn get(&self, stat: TeamStat) -> i32 {
        match stat {
            TeamStat::Votes => self.votes,
            TeamStat::Bid => self.bid,
            TeamStat::Income => self.income,
            TeamStat::Buffs => self.buffs,
        }
    }

    /// Votes won so far.
    #[must_use]
    pub const fn votes(&self) -> i32 {
        self.votes
    }

    pub(crate) fn set(&mut self, stat: TeamStat, value: i32) {
        match stat {
            TeamStat::Votes => self.votes = value,
            TeamStat::Bid => self.bid = value,
            TeamStat::Income => self.income = value,
            TeamStat::Buffs => self.buffs = value,
        }
    }

    pub(crate) fn add_body(&mut self, body_type: BodyTypeId) {
        *self.body_counts.entry(body_type).or_insert(0) += 1;
    }

    pub(crate) fn remove_body(&mut self, body_type: BodyTypeId) {
        if let Some(count) = self.body_counts.get_mut(&body_type) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.body_counts.remove(&body_type);
            }
        }
    }
}
