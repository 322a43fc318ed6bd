//! Owned body rows and the names of their mutable fields.

use std::fmt;

use playback_foundation::{BodyTypeId, EntityId, TeamId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mutable column of the body store.
///
/// Every field is written through an `i32`. `Team` and `BodyType` values
/// must fit in a `u8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyField {
    /// Owning team.
    Team,
    /// Body type.
    BodyType,
    /// X coordinate.
    X,
    /// Y coordinate.
    Y,
    /// Influence held by the body.
    Influence,
    /// Conviction held by the body.
    Conviction,
    /// Flag value broadcast by the body.
    Flag,
    /// Bytecodes spent on the last turn.
    BytecodesUsed,
}

impl BodyField {
    /// All fields, in column order.
    pub const ALL: [Self; 8] = [
        Self::Team,
        Self::BodyType,
        Self::X,
        Self::Y,
        Self::Influence,
        Self::Conviction,
        Self::Flag,
        Self::BytecodesUsed,
    ];

    /// Returns the field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::BodyType => "body_type",
            Self::X => "x",
            Self::Y => "y",
            Self::Influence => "influence",
            Self::Conviction => "conviction",
            Self::Flag => "flag",
            Self::BytecodesUsed => "bytecodes_used",
        }
    }
}

impl fmt::Display for BodyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One body, as a plain record. Used for spawns and for copying rows out of
/// the columnar store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyRow {
    /// Body id.
    pub id: EntityId,
    /// Owning team.
    pub team: TeamId,
    /// Body type.
    pub body_type: BodyTypeId,
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Influence.
    pub influence: i32,
    /// Conviction.
    pub conviction: i32,
    /// Flag.
    pub flag: i32,
    /// Bytecodes used last turn.
    pub bytecodes_used: i32,
}

impl BodyRow {
    /// Creates a row at a position with zeroed resources.
    #[must_use]
    pub const fn new(id: EntityId, team: TeamId, body_type: BodyTypeId, x: i32, y: i32) -> Self {
        Self {
            id,
            team,
            body_type,
            x,
            y,
            influence: 0,
            conviction: 0,
            flag: 0,
            bytecodes_used: 0,
        }
    }

    /// Builder method to set influence.
    #[must_use]
    pub const fn with_influence(mut self, influence: i32) -> Self {
        self.influence = influence;
        self
    }

    /// Builder method to set conviction.
    #[must_use]
    pub const fn with_conviction(mut self, conviction: i32) -> Self {
        self.conviction = conviction;
        self
    }

    /// Builder method to set the flag.
    #[must_use]
    pub const fn with_flag(mut self, flag: i32) -> Self {
        self.flag = flag;
        self
    }

    /// Returns `(x, y)`.
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Reads a field as an `i32`.
    #[must_use]
    pub fn field(&self, field: BodyField) -> i32 {
        match field {
            BodyField::Team => i32::from(self.team.get()),
            BodyField::BodyType => i32::from(self.body_type.get()),
            BodyField::X => self.x,
            BodyField::Y => self.y,
            BodyField::Influence => self.influence,
            BodyField::Conviction => self.conviction,
            BodyField::Flag => self.flag,
            BodyField::BytecodesUsed => self.bytecodes_used,
        }
    }
}
