//! Versioned binary container for Playback matches and games.
//!
//! A container is the magic `PBRL`, a little-endian `u16` format version,
//! then a sequence of frames. Each frame is a little-endian `u32` length
//! followed by a `MessagePack` body with named fields:
//!
//! ```text
//! PBRL | version | len Header | len Delta(1) | len Delta(2) | ... | len Footer?
//! ```
//!
//! A game container opens with a game header instead and holds several
//! matches on shared metadata, each begun by a match start frame.
//!
//! - [`encode_match`] / [`decode_match`] work on whole single-match containers
//! - [`encode_game`] / [`decode_game`] work on whole game containers
//! - [`StreamDecoder`] decodes a live stream of either kind fed in arbitrary
//!   pieces
//! - [`ProfilerFile`] carries per-team profiler recordings in match footers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decode;
pub mod encode;
pub mod frame;
pub mod profiler;

pub use decode::{DecodedGame, DecodedMatch, GameMatch, StreamDecoder, decode_game, decode_match};
pub use encode::{encode_frame, encode_game, encode_match, preamble};
pub use frame::{Frame, GameFooter, GameHeader, MAGIC, MatchFooter, MatchHeader, VERSION};
pub use profiler::{ProfilerEvent, ProfilerFile, ProfilerProfile};
