//! The full simulation state at one turn.
//!
//! A `GameWorld` is mutated in place, one delta record at a time. Clones are
//! taken only for the snapshot cache; metadata and the map are shared via
//! `Arc` so a clone copies just the body columns and team stats.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use playback_foundation::{BodyTypeId, EntityId, Error, ErrorKind, Result, TeamId, Turn};
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::{BodyField, BodyRow};
use crate::delta::DeltaRecord;
use crate::map::MapInfo;
use crate::metadata::Metadata;
use crate::soa::{BodyRef, BodyStore, narrow};
use crate::stats::TeamStats;

/// Turn-0 contents of a match as carried by the wire format.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InitialState {
    /// The map.
    pub map: MapInfo,
    /// Bodies present before the first turn.
    pub bodies: Vec<BodyRow>,
}

/// Simulation state at one turn.
#[derive(Clone, Debug)]
pub struct GameWorld {
    meta: Arc<Metadata>,
    map: Arc<MapInfo>,
    turn: Turn,
    bodies: BodyStore,
    team_stats: BTreeMap<TeamId, TeamStats>,
    winner: Option<TeamId>,
    /// Bodies removed by the most recent delta.
    removed_this_turn: Vec<BodyRow>,
}

impl GameWorld {
    /// Creates an empty world at turn 0 with zeroed stats for every team.
    #[must_use]
    pub fn new(meta: Arc<Metadata>, map: MapInfo) -> Self {
        let team_stats = meta
            .teams()
            .iter()
            .map(|team| (team.id, TeamStats::new()))
            .collect();
        Self {
            meta,
            map: Arc::new(map),
            turn: 0,
            bodies: BodyStore::new(),
            team_stats,
            winner: None,
            removed_this_turn: Vec::new(),
        }
    }

    /// Builds the turn-0 world from a decoded initial state.
    ///
    /// # Errors
    ///
    /// Returns a referential error if a body names an unknown team or type
    /// or two bodies share an id, and `IdOutOfRange` for unindexable ids.
    pub fn from_initial(meta: Arc<Metadata>, initial: InitialState) -> Result<Self> {
        let mut world = Self::new(meta, initial.map);
        for row in initial.bodies {
            world.check_team(row.team)?;
            world.check_body_type(row.body_type)?;
            world.bodies.insert(row).map_err(|e| match e.kind {
                ErrorKind::DuplicateId(id) => Error::spawn_collision(0, id),
                _ => e,
            })?;
            world.count_body(row.team, row.body_type, true);
        }
        Ok(world)
    }

    /// Current turn.
    #[must_use]
    pub const fn turn(&self) -> Turn {
        self.turn
    }

    /// Match metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// Shared handle to the match metadata.
    #[must_use]
    pub fn metadata_arc(&self) -> Arc<Metadata> {
        Arc::clone(&self.meta)
    }

    /// The map.
    #[must_use]
    pub fn map(&self) -> &MapInfo {
        &self.map
    }

    /// Live bodies.
    #[must_use]
    pub fn bodies(&self) -> &BodyStore {
        &self.bodies
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Looks up a live body.
    ///
    /// # Errors
    ///
    /// Returns `UnknownId` if the body is not alive at this turn.
    pub fn body(&self, id: EntityId) -> Result<BodyRef<'_>> {
        self.bodies.get(id)
    }

    /// Stats for one team.
    #[must_use]
    pub fn team_stats(&self, team: TeamId) -> Option<&TeamStats> {
        self.team_stats.get(&team)
    }

    /// Stats for every team, in team id order.
    pub fn all_team_stats(&self) -> impl Iterator<Item = (TeamId, &TeamStats)> {
        self.team_stats.iter().map(|(id, stats)| (*id, stats))
    }

    /// The winner, once one has been declared.
    #[must_use]
    pub const fn winner(&self) -> Option<TeamId> {
        self.winner
    }

    /// Rows of bodies removed by the most recent delta.
    #[must_use]
    pub fn removed_this_turn(&self) -> &[BodyRow] {
        &self.removed_this_turn
    }

    /// Advances the world by exactly one turn.
    ///
    /// Every id, team, and body type the record references is checked before
    /// anything is mutated, so on error the world is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `OutOfSequence` unless `record.turn == self.turn() + 1`, and a
    /// referential error (`DanglingReference`, `SpawnCollision`,
    /// `UnknownTeam`, `UnknownBodyType`, `InvalidFieldValue`) or
    /// `IdOutOfRange` if the record does not fit this world.
    pub fn apply_delta(&mut self, record: &DeltaRecord) -> Result<()> {
        let expected = self.turn + 1;
        if record.turn != expected {
            return Err(Error::out_of_sequence(expected, record.turn));
        }
        self.validate(record)?;

        self.removed_this_turn.clear();
        for id in record.removals() {
            let row = self.bodies.remove(id)?;
            self.count_body(row.team, row.body_type, false);
            self.removed_this_turn.push(row);
        }
        for row in record.spawns() {
            self.bodies.insert(*row)?;
            self.count_body(row.team, row.body_type, true);
        }
        for (id, field, value) in record.field_changes() {
            self.set_body_field(id, field, value)?;
        }
        for (team, stat, value) in record.stat_changes() {
            self.team_stats.entry(team).or_default().set(stat, value);
        }
        if let Some(team) = record.declared_winner() {
            self.winner = Some(team);
        }
        self.turn = expected;

        trace!(
            turn = self.turn,
            changes = record.changes.len(),
            bodies = self.bodies.len(),
            "applied delta"
        );
        Ok(())
    }

    /// Checks a record against this world without mutating it.
    fn validate(&self, record: &DeltaRecord) -> Result<()> {
        let turn = record.turn;
        let mut removed = HashSet::new();
        let mut spawned = HashSet::new();

        for id in record.removals() {
            if !self.bodies.contains(id) || !removed.insert(id) {
                return Err(Error::dangling_reference(turn, id));
            }
        }
        for row in record.spawns() {
            self.check_team(row.team)?;
            self.check_body_type(row.body_type)?;
            if !row.id.is_indexable() {
                return Err(Error::new(ErrorKind::IdOutOfRange(row.id)));
            }
            let occupied = self.bodies.contains(row.id) && !removed.contains(&row.id);
            if occupied || !spawned.insert(row.id) {
                return Err(Error::spawn_collision(turn, row.id));
            }
        }
        for (id, field, value) in record.field_changes() {
            let live = spawned.contains(&id) || (self.bodies.contains(id) && !removed.contains(&id));
            if !live {
                return Err(Error::dangling_reference(turn, id));
            }
            match field {
                BodyField::Team => self.check_team(TeamId::new(narrow(field, value)?))?,
                BodyField::BodyType => {
                    self.check_body_type(BodyTypeId::new(narrow(field, value)?))?;
                }
                _ => {}
            }
        }
        for (team, _, _) in record.stat_changes() {
            self.check_team(team)?;
        }
        if let Some(team) = record.declared_winner() {
            self.check_team(team)?;
        }
        Ok(())
    }

    /// Writes a field, keeping team body counts in step with team and type
    /// changes.
    fn set_body_field(&mut self, id: EntityId, field: BodyField, value: i32) -> Result<()> {
        if matches!(field, BodyField::Team | BodyField::BodyType) {
            let before = self.bodies.get(id)?.to_row();
            self.bodies.set_field(id, field, value)?;
            let after = self.bodies.get(id)?.to_row();
            self.count_body(before.team, before.body_type, false);
            self.count_body(after.team, after.body_type, true);
            Ok(())
        } else {
            self.bodies.set_field(id, field, value)
        }
    }

    fn count_body(&mut self, team: TeamId, body_type: BodyTypeId, added: bool) {
        let stats = self.team_stats.entry(team).or_default();
        if added {
            stats.add_body(body_type);
        } else {
            stats.remove_body(body_type);
        }
    }

    fn check_team(&self, team: TeamId) -> Result<()> {
        if self.meta.has_team(team) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::UnknownTeam(team)))
        }
    }

    fn check_body_type(&self, body_type: BodyTypeId) -> Result<()> {
        if self.meta.has_body_type(body_type) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::UnknownBodyType(body_type)))
        }
    }
}

impl PartialEq for GameWorld {
    fn eq(&self, other: &Self) -> bool {
        self.turn == other.turn
            && self.bodies == other.bodies
            && self.team_stats == other.team_stats
            && self.winner == other.winner
            && self.removed_this_turn == other.removed_this_turn
            && (Arc::ptr_eq(&self.map, &other.map) || self.map == other.map)
            && (Arc::ptr_eq(&self.meta, &other.meta) || self.meta == other.meta)
    }
}
