//! Static match metadata: teams and body type specifications.
//!
//! Metadata is loaded once per match and shared read-only by every world
//! snapshot through an `Arc`.

use std::collections::BTreeMap;

use playback_foundation::{BodyTypeId, TeamId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A team taking part in the match.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TeamInfo {
    /// Team id referenced by delta records.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Name of the package the team's player was built from.
    pub package_name: String,
}

impl TeamInfo {
    /// Creates a team entry with an empty package name.
    #[must_use]
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            package_name: String::new(),
        }
    }

    /// Builder method to set the package name.
    #[must_use]
    pub fn with_package(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }
}

/// Static attributes of a body type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyTypeSpec {
    /// Body type id referenced by delta records.
    pub id: BodyTypeId,
    /// Upper-case name used in log headers (e.g. `POLITICIAN`).
    pub name: String,
    /// Squared radius within which the body can act.
    pub action_radius_squared: i32,
    /// Squared radius within which the body can sense others.
    pub sensor_radius_squared: i32,
    /// Squared radius within which the body can detect others.
    pub detection_radius_squared: i32,
    /// Base cooldown after taking an action.
    pub action_cooldown: f32,
    /// Bytecodes the body may spend per turn.
    pub bytecode_limit: i32,
    /// Body type that spawns this type, if any.
    pub spawn_source: Option<BodyTypeId>,
}

impl BodyTypeSpec {
    /// Creates a spec with zeroed attributes.
    #[must_use]
    pub fn new(id: BodyTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            action_radius_squared: 0,
            sensor_radius_squared: 0,
            detection_radius_squared: 0,
            action_cooldown: 0.0,
            bytecode_limit: 0,
            spawn_source: None,
        }
    }

    /// Builder method to set the three radii.
    #[must_use]
    pub const fn with_radii(mut self, action: i32, sensor: i32, detection: i32) -> Self {
        self.action_radius_squared = action;
        self.sensor_radius_squared = sensor;
        self.detection_radius_squared = detection;
        self
    }

    /// Builder method to set the action cooldown.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.action_cooldown = cooldown;
        self
    }

    /// Builder method to set the bytecode limit.
    #[must_use]
    pub const fn with_bytecode_limit(mut self, limit: i32) -> Self {
        self.bytecode_limit = limit;
        self
    }

    /// Builder method to set the spawning body type.
    #[must_use]
    pub const fn with_spawn_source(mut self, source: BodyTypeId) -> Self {
        self.spawn_source = Some(source);
        self
    }
}

/// Teams and body type table for one match.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metadata {
    /// Teams in declaration order.
    teams: Vec<TeamInfo>,
    /// Body type specs by id.
    body_types: BTreeMap<BodyTypeId, BodyTypeSpec>,
}

impl Metadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a team. A team with the same id is replaced.
    #[must_use]
    pub fn with_team(mut self, team: TeamInfo) -> Self {
        if let Some(existing) = self.teams.iter_mut().find(|t| t.id == team.id) {
            *existing = team;
        } else {
            self.teams.push(team);
        }
        self
    }

    /// Builder method to add a body type spec.
    #[must_use]
    pub fn with_body_type(mut self, spec: BodyTypeSpec) -> Self {
        self.body_types.insert(spec.id, spec);
        self
    }

    /// Returns the teams in declaration order.
    #[must_use]
    pub fn teams(&self) -> &[TeamInfo] {
        &self.teams
    }

    /// Looks up a team by id.
    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&TeamInfo> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Returns true if the team is listed.
    #[must_use]
    pub fn has_team(&self, id: TeamId) -> bool {
        self.team(id).is_some()
    }

    /// Maps a log header letter (`A`, `B`, ...) to the team declared at
    /// that position.
    #[must_use]
    pub fn team_by_letter(&self, letter: char) -> Option<&TeamInfo> {
        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let position = (letter as u8 - b'A') as usize;
        self.teams.get(position)
    }

    /// Iterates body type specs in id order.
    pub fn body_types(&self) -> impl Iterator<Item = &BodyTypeSpec> {
        self.body_types.values()
    }

    /// Looks up a body type spec by id.
    #[must_use]
    pub fn body_type(&self, id: BodyTypeId) -> Option<&BodyTypeSpec> {
        self.body_types.get(&id)
    }

    /// Returns true if the body type is listed.
    #[must_use]
    pub fn has_body_type(&self, id: BodyTypeId) -> bool {
        self.body_types.contains_key(&id)
    }

    /// Looks up a body type spec by its name.
    #[must_use]
    pub fn body_type_by_name(&self, name: &str) -> Option<&BodyTypeSpec> {
        self.body_types.values().find(|spec| spec.name == name)
    }
}
