//! Per-turn delta records and the append-only delta log.

// Log length is bounded by the u32 turn counter.
#![allow(clippy::cast_possible_truncation)]

use std::sync::Arc;

use playback_foundation::{EntityId, Error, Result, TeamId, Turn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::{BodyField, BodyRow};
use crate::stats::TeamStat;
use crate::world::GameWorld;

/// One typed change inside a delta record.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Change {
    /// A body appears.
    Spawn(BodyRow),
    /// A body disappears.
    Remove(EntityId),
    /// One field of a live body changes.
    SetField {
        /// Body to change.
        id: EntityId,
        /// Field to overwrite.
        field: BodyField,
        /// New value.
        value: i32,
    },
    /// A team statistic changes.
    SetStat {
        /// Team to change.
        team: TeamId,
        /// Stat to overwrite.
        stat: TeamStat,
        /// New value.
        value: i32,
    },
    /// The match has a winner.
    Winner(TeamId),
}

/// All changes that move the world from `turn - 1` into `turn`.
///
/// Within a record, changes take effect grouped by kind: removals, spawns,
/// field changes, stats, then the winner. An id freed and reused in the same
/// turn therefore never collides with itself.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeltaRecord {
    /// Turn this record transitions into.
    pub turn: Turn,
    /// Changes in emission order.
    pub changes: Vec<Change>,
    /// Raw log text the bodies printed during this turn.
    pub logs: String,
}

impl DeltaRecord {
    /// Creates an empty record for `turn`.
    #[must_use]
    pub fn new(turn: Turn) -> Self {
        Self {
            turn,
            changes: Vec::new(),
            logs: String::new(),
        }
    }

    /// Builder method to add a change.
    #[must_use]
    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    /// Builder method to spawn a body.
    #[must_use]
    pub fn spawn(self, row: BodyRow) -> Self {
        self.with_change(Change::Spawn(row))
    }

    /// Builder method to remove a body.
    #[must_use]
    pub fn remove(self, id: EntityId) -> Self {
        self.with_change(Change::Remove(id))
    }

    /// Builder method to set a body field.
    #[must_use]
    pub fn set_field(self, id: EntityId, field: BodyField, value: i32) -> Self {
        self.with_change(Change::SetField { id, field, value })
    }

    /// Builder method to move a body. Expands to two field changes.
    #[must_use]
    pub fn move_to(self, id: EntityId, x: i32, y: i32) -> Self {
        self.set_field(id, BodyField::X, x)
            .set_field(id, BodyField::Y, y)
    }

    /// Builder method to set a team stat.
    #[must_use]
    pub fn set_stat(self, team: TeamId, stat: TeamStat, value: i32) -> Self {
        self.with_change(Change::SetStat { team, stat, value })
    }

    /// Builder method to declare the winner.
    #[must_use]
    pub fn winner(self, team: TeamId) -> Self {
        self.with_change(Change::Winner(team))
    }

    /// Builder method to attach log text.
    #[must_use]
    pub fn with_logs(mut self, logs: impl Into<String>) -> Self {
        self.logs = logs.into();
        self
    }

    /// Ids removed by this record, in emission order.
    pub fn removals(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.changes.iter().filter_map(|c| match c {
            Change::Remove(id) => Some(*id),
            _ => None,
        })
    }

    /// Rows spawned by this record, in emission order.
    pub fn spawns(&self) -> impl Iterator<Item = &BodyRow> + '_ {
        self.changes.iter().filter_map(|c| match c {
            Change::Spawn(row) => Some(row),
            _ => None,
        })
    }

    /// Field changes in this record, in emission order.
    pub fn field_changes(&self) -> impl Iterator<Item = (EntityId, BodyField, i32)> + '_ {
        self.changes.iter().filter_map(|c| match c {
            Change::SetField { id, field, value } => Some((*id, *field, *value)),
            _ => None,
        })
    }

    /// Stat changes in this record, in emission order.
    pub fn stat_changes(&self) -> impl Iterator<Item = (TeamId, TeamStat, i32)> + '_ {
        self.changes.iter().filter_map(|c| match c {
            Change::SetStat { team, stat, value } => Some((*team, *stat, *value)),
            _ => None,
        })
    }

    /// The last winner declared by this record, if any.
    #[must_use]
    pub fn declared_winner(&self) -> Option<TeamId> {
        self.changes.iter().rev().find_map(|c| match c {
            Change::Winner(team) => Some(*team),
            _ => None,
        })
    }
}

/// Initial snapshot plus the ordered delta records 1..N of a match.
///
/// The log only grows. Records are shared behind `Arc` in a persistent
/// vector, so cloning the log to hand it to another reader is cheap.
#[derive(Clone, Debug)]
pub struct DeltaLog {
    initial: Arc<GameWorld>,
    records: im::Vector<Arc<DeltaRecord>>,
    closed: bool,
}

impl DeltaLog {
    /// Creates a log holding only the initial snapshot.
    #[must_use]
    pub fn new(initial: GameWorld) -> Self {
        Self {
            initial: Arc::new(initial),
            records: im::Vector::new(),
            closed: false,
        }
    }

    /// The snapshot records are applied on top of.
    #[must_use]
    pub fn initial(&self) -> &Arc<GameWorld> {
        &self.initial
    }

    /// Turn of the newest record, or the initial turn if there are none.
    #[must_use]
    pub fn last_turn(&self) -> Turn {
        self.initial.turn() + self.records.len() as Turn
    }

    /// Number of delta records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the log holds no delta records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true once the log has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// The record transitioning into `turn`.
    #[must_use]
    pub fn get(&self, turn: Turn) -> Option<&Arc<DeltaRecord>> {
        let offset = turn.checked_sub(self.initial.turn())?.checked_sub(1)?;
        self.records.get(offset as usize)
    }

    /// Iterates records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<DeltaRecord>> {
        self.records.iter()
    }

    /// Appends a record.
    ///
    /// Only the turn sequence is checked here; referential integrity is
    /// checked when the record is applied to a world.
    ///
    /// # Errors
    ///
    /// Returns `OutOfSequence` unless `record.turn == last_turn() + 1`, or a
    /// decode error if the log is closed.
    pub fn push(&mut self, record: DeltaRecord) -> Result<()> {
        if self.closed {
            return Err(Error::decode(format!(
                "delta for turn {} arrived after the log was closed",
                record.turn
            )));
        }
        let expected = self.last_turn() + 1;
        if record.turn != expected {
            return Err(Error::out_of_sequence(expected, record.turn));
        }
        self.records.push_back(Arc::new(record));
        Ok(())
    }

    /// Marks the log final. No records can be pushed afterwards.
    pub fn close(&mut self) {
        self.closed = true;
    }
}
