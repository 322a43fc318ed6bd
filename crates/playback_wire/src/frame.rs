//! Frame types carried by the container.
//!
//! A container holds either one match or a game of several matches:
//!
//! ```text
//! match: Header Delta* Footer?
//! game:  GameHeader (MatchStart Delta* Footer)* [MatchStart Delta*] GameFooter?
//! ```
//!
//! Matches in a game share the game header's metadata, so `MatchStart`
//! carries only the initial state.

use playback_foundation::{TeamId, Turn};
use playback_storage::{DeltaRecord, InitialState, Metadata};
use serde::{Deserialize, Serialize};

use crate::profiler::ProfilerFile;

/// Bytes every container starts with.
pub const MAGIC: [u8; 4] = *b"PBRL";

/// Container format version written by this build.
pub const VERSION: u16 = 1;

/// Length of the magic plus the version.
pub const PREAMBLE_LEN: usize = MAGIC.len() + 2;

/// Length of the little-endian prefix before each frame body.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest frame body the decoder accepts by default (64 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Everything needed to build the turn-0 world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchHeader {
    /// Teams and body types.
    pub metadata: Metadata,
    /// Map and initial bodies.
    pub initial: InitialState,
}

/// Trailer written once a match has ended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFooter {
    /// Winning team, if one was declared.
    pub winner: Option<TeamId>,
    /// Turn of the final delta record.
    pub total_turns: Turn,
    /// Profiler recordings, usually one per team. Empty when profiling was
    /// off.
    #[serde(default)]
    pub profiler_files: Vec<ProfilerFile>,
}

impl MatchFooter {
    /// Creates a footer without profiler data.
    #[must_use]
    pub const fn new(winner: Option<TeamId>, total_turns: Turn) -> Self {
        Self {
            winner,
            total_turns,
            profiler_files: Vec::new(),
        }
    }

    /// Builder method to attach a profiler file.
    #[must_use]
    pub fn with_profiler_file(mut self, file: ProfilerFile) -> Self {
        self.profiler_files.push(file);
        self
    }
}

/// Opens a game container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameHeader {
    /// Teams and body types shared by every match of the game.
    pub metadata: Metadata,
}

/// Trailer written once every match of a game has ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFooter {
    /// Overall winner, if one was declared.
    pub winner: Option<TeamId>,
    /// Number of matches in the game.
    pub total_matches: u32,
}

/// A single length-prefixed unit of the container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    /// First frame of a single-match container.
    Header(MatchHeader),
    /// One per turn, in turn order starting at 1.
    Delta(DeltaRecord),
    /// Ends a match. Optional for the last match only.
    Footer(MatchFooter),
    /// First frame of a game container.
    GameHeader(GameHeader),
    /// Begins the next match of a game.
    MatchStart(InitialState),
    /// Optional, always last in a game container.
    GameFooter(GameFooter),
}

impl Frame {
    /// Short name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Header(_) => "header",
            Self::Delta(_) => "delta",
            Self::Footer(_) => "footer",
            Self::GameHeader(_) => "game header",
            Self::MatchStart(_) => "match start",
            Self::GameFooter(_) => "game footer",
        }
    }
}

/// Borrowing twin of [`Frame`]. Serializes to identical bytes.
#[derive(Serialize)]
pub(crate) enum FrameRef<'a> {
    Header(&'a MatchHeader),
    Delta(&'a DeltaRecord),
    Footer(&'a MatchFooter),
    GameHeader(&'a GameHeader),
    MatchStart(&'a InitialState),
    GameFooter(&'a GameFooter),
}

impl<'a> From<&'a Frame> for FrameRef<'a> {
    fn from(frame: &'a Frame) -> Self {
        match frame {
            Frame::Header(h) => Self::Header(h),
            Frame::Delta(d) => Self::Delta(d),
            Frame::Footer(f) => Self::Footer(f),
            Frame::GameHeader(h) => Self::GameHeader(h),
            Frame::MatchStart(i) => Self::MatchStart(i),
            Frame::GameFooter(f) => Self::GameFooter(f),
        }
    }
}
