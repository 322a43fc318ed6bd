//! Reading the container, whole or incrementally.
//!
//! [`StreamDecoder`] buffers whatever bytes it is fed and hands out frames
//! only once they are complete, so a live producer can write at any
//! granularity. It also enforces frame order: a header first, deltas with
//! consecutive turns from 1, and footers only where a match or game ends.
//!
//! Every error is fatal to the stream. After the first failure the decoder
//! refuses further frames.

use playback_foundation::{Error, ErrorContext, ErrorKind, Result, Turn};
use playback_storage::{DeltaRecord, InitialState};
use tracing::{debug, trace};

use crate::frame::{
    DEFAULT_MAX_FRAME_LEN, Frame, GameFooter, GameHeader, LENGTH_PREFIX_LEN, MAGIC, MatchFooter,
    MatchHeader, PREAMBLE_LEN, VERSION,
};

/// A fully decoded single-match container.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedMatch {
    /// Metadata and initial state.
    pub header: MatchHeader,
    /// Delta records in turn order.
    pub deltas: Vec<DeltaRecord>,
    /// Present only if the match was finished when written.
    pub footer: Option<MatchFooter>,
}

impl DecodedMatch {
    /// Turn of the last delta, or 0 if there are none.
    #[must_use]
    pub fn last_turn(&self) -> Turn {
        self.deltas.last().map_or(0, |d| d.turn)
    }
}

/// One match of a game, without the metadata the game header supplies.
#[derive(Clone, Debug, PartialEq)]
pub struct GameMatch {
    /// Map and initial bodies.
    pub initial: InitialState,
    /// Delta records in turn order.
    pub deltas: Vec<DeltaRecord>,
    /// Present once the match has ended.
    pub footer: Option<MatchFooter>,
}

/// A fully decoded game container.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedGame {
    /// Shared metadata.
    pub header: GameHeader,
    /// Matches in play order.
    pub matches: Vec<GameMatch>,
    /// Present only if the game was finished when written.
    pub footer: Option<GameFooter>,
}

/// Decodes a complete single-match container held in memory.
///
/// # Errors
///
/// Returns a protocol error if the input is malformed, truncated, out of
/// order, or a game container, or `UnsupportedVersion` for containers from
/// a newer format.
pub fn decode_match(bytes: &[u8]) -> Result<DecodedMatch> {
    let mut decoder = StreamDecoder::new().with_source("match container");
    decoder.feed(bytes);

    let mut header = None;
    let mut deltas = Vec::new();
    let mut footer = None;
    while let Some(frame) = decoder.next_frame()? {
        match frame {
            Frame::Header(h) => header = Some(h),
            Frame::Delta(d) => deltas.push(d),
            Frame::Footer(f) => footer = Some(f),
            Frame::GameHeader(_) | Frame::MatchStart(_) | Frame::GameFooter(_) => {
                return Err(decoder.error(Error::decode(
                    "game container holds several matches; decode it as a game",
                )));
            }
        }
    }

    decoder.finish()?;
    let header = header.ok_or_else(|| decoder.error(Error::decode("missing header frame")))?;
    Ok(DecodedMatch {
        header,
        deltas,
        footer,
    })
}

/// Decodes a complete game container held in memory.
///
/// # Errors
///
/// Returns a protocol error if the input is malformed, truncated, out of
/// order, or a single-match container, or `UnsupportedVersion` for
/// containers from a newer format.
pub fn decode_game(bytes: &[u8]) -> Result<DecodedGame> {
    let mut decoder = StreamDecoder::new().with_source("game container");
    decoder.feed(bytes);

    let mut header = None;
    let mut matches: Vec<GameMatch> = Vec::new();
    let mut footer = None;
    while let Some(frame) = decoder.next_frame()? {
        match frame {
            Frame::GameHeader(h) => header = Some(h),
            Frame::MatchStart(initial) => matches.push(GameMatch {
                initial,
                deltas: Vec::new(),
                footer: None,
            }),
            Frame::Delta(d) => match matches.last_mut() {
                Some(current) => current.deltas.push(d),
                None => return Err(decoder.error(Error::decode("delta outside a match"))),
            },
            Frame::Footer(f) => match matches.last_mut() {
                Some(current) => current.footer = Some(f),
                None => return Err(decoder.error(Error::decode("footer outside a match"))),
            },
            Frame::GameFooter(f) => footer = Some(f),
            Frame::Header(_) => {
                return Err(decoder.error(Error::decode(
                    "single match container; decode it as a match",
                )));
            }
        }
    }

    decoder.finish()?;
    let header =
        header.ok_or_else(|| decoder.error(Error::decode("missing game header frame")))?;
    Ok(DecodedGame {
        header,
        matches,
        footer,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Preamble,
    Header,
    Deltas { last_turn: Turn },
    /// Inside a game, between two matches.
    Between,
    Finished,
    Failed,
}

/// Incremental decoder for a container arriving in pieces.
#[derive(Debug)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    /// Absolute offset of `buffer[0]` in the stream.
    offset: usize,
    state: State,
    max_frame_len: usize,
    source: String,
    game: bool,
    matches_started: u32,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    /// Creates a decoder expecting the container preamble.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            offset: 0,
            state: State::Preamble,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            source: "stream".to_string(),
            game: false,
            matches_started: 0,
        }
    }

    /// Builder method to name the stream in error context.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Builder method to cap the size of a single frame body.
    #[must_use]
    pub const fn with_max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = max;
        self
    }

    /// Appends raw bytes to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Returns the next complete frame, or `None` if more input is needed.
    ///
    /// # Errors
    ///
    /// Returns a protocol error on malformed or out-of-order input. The
    /// decoder is unusable afterwards.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.state == State::Failed {
            return Err(self.error(Error::decode("stream already failed")));
        }
        match self.step() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                let e = self.error(e);
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    /// Checks that the stream ended cleanly: no partial frame is buffered.
    ///
    /// # Errors
    ///
    /// Returns a decode error if bytes of an incomplete frame remain.
    pub fn finish(&self) -> Result<()> {
        if self.state == State::Preamble {
            return Err(self.error(Error::decode(format!(
                "truncated preamble: {} of {PREAMBLE_LEN} bytes",
                self.buffer.len()
            ))));
        }
        if !self.buffer.is_empty() {
            return Err(self.error(Error::decode(format!(
                "truncated frame: {} trailing bytes",
                self.buffer.len()
            ))));
        }
        Ok(())
    }

    /// Bytes received but not yet returned as a frame.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes consumed by returned frames, preamble included.
    #[must_use]
    pub const fn bytes_consumed(&self) -> usize {
        self.offset
    }

    /// Returns true once the match or game header has been returned.
    #[must_use]
    pub const fn has_header(&self) -> bool {
        matches!(
            self.state,
            State::Deltas { .. } | State::Between | State::Finished
        )
    }

    /// Returns true if the stream opened with a game header.
    #[must_use]
    pub const fn is_game(&self) -> bool {
        self.game
    }

    /// Match start frames returned so far.
    #[must_use]
    pub const fn matches_started(&self) -> u32 {
        self.matches_started
    }

    /// Returns true once the final footer frame has been returned: the
    /// match footer of a single match, or the game footer.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Turn of the last delta returned while deltas are expected: `Some(0)`
    /// right after a header or match start, `None` outside a match.
    #[must_use]
    pub const fn last_turn(&self) -> Option<Turn> {
        match self.state {
            State::Deltas { last_turn } => Some(last_turn),
            _ => None,
        }
    }

    fn step(&mut self) -> Result<Option<Frame>> {
        if self.state == State::Preamble {
            if self.buffer.len() < PREAMBLE_LEN {
                return Ok(None);
            }
            self.read_preamble()?;
        }

        if self.state == State::Finished {
            if self.buffer.is_empty() {
                return Ok(None);
            }
            return Err(Error::decode("bytes after final footer frame"));
        }

        let Some(len) = self.peek_len()? else {
            return Ok(None);
        };
        let total = LENGTH_PREFIX_LEN + len;
        if self.buffer.len() < total {
            return Ok(None);
        }

        let frame: Frame = rmp_serde::from_slice(&self.buffer[LENGTH_PREFIX_LEN..total])
            .map_err(|e| Error::decode(format!("malformed frame: {e}")))?;
        self.check_order(&frame)?;
        self.consume(total);
        Ok(Some(frame))
    }

    fn read_preamble(&mut self) -> Result<()> {
        if self.buffer[..MAGIC.len()] != MAGIC {
            return Err(Error::decode("bad magic: not a match container"));
        }
        let version = u16::from_le_bytes([self.buffer[MAGIC.len()], self.buffer[MAGIC.len() + 1]]);
        if version != VERSION {
            return Err(Error::new(ErrorKind::UnsupportedVersion {
                found: version,
                supported: VERSION,
            }));
        }
        self.consume(PREAMBLE_LEN);
        self.state = State::Header;
        Ok(())
    }

    fn peek_len(&self) -> Result<Option<usize>> {
        let Some(prefix) = self.buffer.get(..LENGTH_PREFIX_LEN) else {
            return Ok(None);
        };
        let mut raw = [0u8; LENGTH_PREFIX_LEN];
        raw.copy_from_slice(prefix);
        let len = u32::from_le_bytes(raw) as usize;
        if len > self.max_frame_len {
            return Err(Error::decode(format!(
                "frame of {len} bytes exceeds limit of {}",
                self.max_frame_len
            )));
        }
        Ok(Some(len))
    }

    fn check_order(&mut self, frame: &Frame) -> Result<()> {
        self.state = match (self.state, frame) {
            (State::Header, Frame::Header(header)) => {
                header.initial.map.check_tiles()?;
                debug!(
                    teams = header.metadata.teams().len(),
                    bodies = header.initial.bodies.len(),
                    map = %header.initial.map.name,
                    "decoded match header"
                );
                State::Deltas { last_turn: 0 }
            }
            (State::Header, Frame::GameHeader(header)) => {
                debug!(teams = header.metadata.teams().len(), "decoded game header");
                self.game = true;
                State::Between
            }
            (State::Between, Frame::MatchStart(initial)) => {
                initial.map.check_tiles()?;
                self.matches_started += 1;
                debug!(
                    index = self.matches_started - 1,
                    bodies = initial.bodies.len(),
                    map = %initial.map.name,
                    "decoded match start"
                );
                State::Deltas { last_turn: 0 }
            }
            (State::Between, Frame::GameFooter(footer)) => {
                if footer.total_matches != self.matches_started {
                    return Err(Error::decode(format!(
                        "game footer reports {} matches but stream carried {}",
                        footer.total_matches, self.matches_started
                    )));
                }
                debug!(
                    matches = self.matches_started,
                    winner = ?footer.winner,
                    "decoded game footer"
                );
                State::Finished
            }
            (State::Deltas { last_turn }, Frame::Delta(record)) => {
                if record.turn != last_turn + 1 {
                    return Err(Error::out_of_sequence(last_turn + 1, record.turn));
                }
                trace!(turn = record.turn, changes = record.changes.len(), "decoded delta");
                State::Deltas {
                    last_turn: record.turn,
                }
            }
            (State::Deltas { last_turn }, Frame::Footer(footer)) => {
                if footer.total_turns != last_turn {
                    return Err(Error::decode(format!(
                        "footer reports {} turns but stream carried {last_turn}",
                        footer.total_turns
                    )));
                }
                for file in &footer.profiler_files {
                    file.check()?;
                }
                debug!(
                    total_turns = last_turn,
                    winner = ?footer.winner,
                    profiler_files = footer.profiler_files.len(),
                    "decoded match footer"
                );
                if self.game {
                    State::Between
                } else {
                    State::Finished
                }
            }
            (State::Header, other) => {
                return Err(Error::decode(format!(
                    "expected header frame, found {}",
                    other.kind_name()
                )));
            }
            (_, other) => {
                return Err(Error::decode(format!(
                    "unexpected {} frame",
                    other.kind_name()
                )));
            }
        };
        Ok(())
    }

    fn consume(&mut self, n: usize) {
        self.buffer.drain(..n);
        self.offset += n;
    }

    fn error(&self, err: Error) -> Error {
        if err.context.is_some() {
            return err;
        }
        let mut context = ErrorContext::new()
            .with_source(self.source.clone())
            .with_offset(self.offset);
        if let State::Deltas { last_turn } = self.state {
            context = context.with_turn(last_turn);
        }
        if self.game && self.matches_started > 0 {
            context = context.with_frame(format!("match {}", self.matches_started - 1));
        }
        err.with_context(context)
    }
}
