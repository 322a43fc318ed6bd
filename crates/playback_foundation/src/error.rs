//! Error types for the Playback system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every kind belongs to an [`ErrorCategory`] so callers can tell a corrupt
//! stream apart from a stale selection or an out-of-range seek.

use std::fmt;

use thiserror::Error;

use crate::entity::{BodyTypeId, EntityId, TeamId, Turn};

/// The main error type for Playback operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Creates an unknown id error.
    #[must_use]
    pub fn unknown_id(id: EntityId) -> Self {
        Self::new(ErrorKind::UnknownId(id))
    }

    /// Creates a duplicate id error.
    #[must_use]
    pub fn duplicate_id(id: EntityId) -> Self {
        Self::new(ErrorKind::DuplicateId(id))
    }

    /// Creates an out-of-sequence error.
    #[must_use]
    pub fn out_of_sequence(expected: Turn, actual: Turn) -> Self {
        Self::new(ErrorKind::OutOfSequence { expected, actual })
    }

    /// Creates a dangling reference error.
    #[must_use]
    pub fn dangling_reference(turn: Turn, id: EntityId) -> Self {
        Self::new(ErrorKind::DanglingReference { turn, id })
    }

    /// Creates a spawn collision error.
    #[must_use]
    pub fn spawn_collision(turn: Turn, id: EntityId) -> Self {
        Self::new(ErrorKind::SpawnCollision { turn, id })
    }

    /// Creates a seek out of range error.
    #[must_use]
    pub fn seek_out_of_range(requested: Turn, last: Turn) -> Self {
        Self::new(ErrorKind::SeekOutOfRange { requested, last })
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode(message.into()))
    }

    /// Creates an encode error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encode(message.into()))
    }
}

/// Broad classes of failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or out-of-sequence input. Fatal to that decode.
    Protocol,
    /// A delta refers to something that does not exist, or collides with
    /// something that does. The target snapshot is left unchanged.
    Referential,
    /// A seek past the end of a closed log. Callers clamp and carry on.
    Range,
    /// A direct store lookup on an absent id. Expected during playback.
    Lookup,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol => write!(f, "protocol"),
            Self::Referential => write!(f, "referential"),
            Self::Range => write!(f, "range"),
            Self::Lookup => write!(f, "lookup"),
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// No live body has this id.
    #[error("unknown id: {0}")]
    UnknownId(EntityId),

    /// A live body already has this id.
    #[error("duplicate id: {0}")]
    DuplicateId(EntityId),

    /// Id is beyond what the dense id table indexes.
    #[error("id out of range: {0} (max {max})", max = EntityId::MAX_INDEXED)]
    IdOutOfRange(EntityId),

    /// A delta record arrived or was applied out of order.
    #[error("out of sequence delta: expected turn {expected}, got {actual}")]
    OutOfSequence {
        /// The turn that was expected next.
        expected: Turn,
        /// The turn the record carried.
        actual: Turn,
    },

    /// A delta removes or mutates a body that is not alive.
    #[error("turn {turn}: delta references missing body {id}")]
    DanglingReference {
        /// The turn of the offending record.
        turn: Turn,
        /// The missing id.
        id: EntityId,
    },

    /// A delta spawns a body whose id is already alive.
    #[error("turn {turn}: spawn collides with live body {id}")]
    SpawnCollision {
        /// The turn of the offending record.
        turn: Turn,
        /// The colliding id.
        id: EntityId,
    },

    /// A delta names a team that the metadata does not list.
    #[error("unknown team: {0}")]
    UnknownTeam(TeamId),

    /// A delta names a body type that the metadata does not list.
    #[error("unknown body type: {0}")]
    UnknownBodyType(BodyTypeId),

    /// A field value cannot be stored in its column.
    #[error("invalid value {value} for field {field}")]
    InvalidFieldValue {
        /// The field name.
        field: String,
        /// The rejected value.
        value: i32,
    },

    /// Seek target lies beyond the last turn of a closed log.
    #[error("seek out of range: turn {requested} (last turn {last})")]
    SeekOutOfRange {
        /// The requested turn.
        requested: Turn,
        /// The last turn in the log.
        last: Turn,
    },

    /// The container or a frame inside it is malformed.
    #[error("decode error: {0}")]
    Decode(String),

    /// A value could not be encoded into the container.
    #[error("encode error: {0}")]
    Encode(String),

    /// The container was written by an unsupported format version.
    #[error("unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// The version found in the container.
        found: u16,
        /// The version this build understands.
        supported: u16,
    },
}

impl ErrorKind {
    /// Returns the category this kind belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::OutOfSequence { .. }
            | Self::Decode(_)
            | Self::Encode(_)
            | Self::UnsupportedVersion { .. }
            | Self::IdOutOfRange(_) => ErrorCategory::Protocol,
            Self::DanglingReference { .. }
            | Self::SpawnCollision { .. }
            | Self::UnknownTeam(_)
            | Self::UnknownBodyType(_)
            | Self::InvalidFieldValue { .. } => ErrorCategory::Referential,
            Self::SeekOutOfRange { .. } => ErrorCategory::Range,
            Self::UnknownId(_) | Self::DuplicateId(_) => ErrorCategory::Lookup,
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Where the failing input came from (a stream name, a file).
    pub source: Option<String>,
    /// Byte offset into the source, for decode failures.
    pub offset: Option<usize>,
    /// Turn being processed when the error occurred.
    pub turn: Option<Turn>,
    /// Operations that were in progress, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the byte offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the turn.
    #[must_use]
    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turn = Some(turn);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
            if let Some(offset) = self.offset {
                write!(f, " at byte {offset}")?;
            }
        }
        if let Some(turn) = self.turn {
            write!(f, " (turn {turn})")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
