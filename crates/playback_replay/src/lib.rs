//! Seekable match playback for Playback.
//!
//! This crate provides:
//! - [`Match`] - Replay controller with `seek` and budgeted `compute`
//! - [`Game`] - Several matches sharing one set of metadata
//! - [`SnapshotCache`] - Stride-spaced world snapshots for cheap backward seeks
//! - [`LogFilter`] - Per-turn body log entries indexed by turn and entity
//! - [`ReplayConfig`] - Snapshot stride, cache policy, and frame budget
//! - [`Clock`] - Time source abstraction so compute budgets are testable
//!
//! # Example
//!
//! ```text
//! let mut game = Match::from_decoded(decode_match(&bytes)?, ReplayConfig::default())?;
//! game.seek(120)?;             // jump, replaying from the nearest snapshot
//! game.play();                 // then play forward
//! loop {
//!     game.compute_frame();    // at most ~5 ms per call
//!     render(game.current());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod controller;
pub mod game;
pub mod logs;

pub use cache::SnapshotCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CachePolicy, ReplayConfig};
pub use controller::{ComputeReport, ComputeStatus, Match, PlaybackTarget};
pub use game::Game;
pub use logs::{LogEntry, LogFilter, LogQuery};
