//! Seekable playback of a recorded or live match.
//!
//! A [`Match`] owns the delta log and three worlds' worth of state:
//!
//! - `current`, the world the host renders, moved by `seek` and `compute`
//! - `frontier`, the world at the log's last turn, used to validate ingest
//! - the snapshot cache, stride-spaced clones used to seek backward cheaply
//!
//! Every record is applied to the frontier before it is appended, so a record
//! that is referentially broken never enters the log and replaying the log
//! from any cached snapshot cannot fail.
//!
//! The match is driven, not self-driving: it owns no timer. A host calls
//! [`Match::compute`] once per frame and reads [`Match::current`] in between.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use playback_foundation::{Error, ErrorContext, Result, TeamId, Turn};
use playback_storage::{DeltaLog, DeltaRecord, GameWorld, InitialState, Metadata};
use playback_wire::{DecodedMatch, Frame, MatchFooter, MatchHeader, ProfilerFile, StreamDecoder};
use tracing::{debug, error, trace, warn};

use crate::cache::SnapshotCache;
use crate::clock::{Clock, SystemClock};
use crate::config::{CachePolicy, ReplayConfig};
use crate::logs::LogFilter;

// =============================================================================
// Playback Target
// =============================================================================

/// Where playback is heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackTarget {
    /// A fixed turn. May lie past the end of a live log.
    Turn(Turn),
    /// The end of the log, following it as it grows.
    End,
}

impl fmt::Display for PlaybackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turn(turn) => write!(f, "turn {turn}"),
            Self::End => write!(f, "end"),
        }
    }
}

// =============================================================================
// Compute Report
// =============================================================================

/// Why a `compute` call returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputeStatus {
    /// Already at the target. Nothing was applied.
    Idle,
    /// The target was reached during this call.
    ReachedTarget,
    /// The budget ran out before the target.
    BudgetExhausted,
    /// The log ended before the target; more records are expected.
    AwaitingRecords,
    /// A logged record failed to replay. Playback cannot advance past it.
    Stalled,
}

/// Outcome of one `compute` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputeReport {
    /// Delta records applied.
    pub applied: usize,
    /// Time spent, as measured by the clock.
    pub elapsed: Duration,
    /// Turn of the current world afterwards.
    pub turn: Turn,
    /// Why the call returned.
    pub status: ComputeStatus,
}

impl fmt::Display for ComputeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records in {:?}, now at turn {} ({:?})",
            self.applied, self.elapsed, self.turn, self.status
        )
    }
}

// =============================================================================
// Match
// =============================================================================

/// Replay controller for one match.
#[derive(Clone, Debug)]
pub struct Match {
    config: ReplayConfig,
    log: DeltaLog,
    cache: SnapshotCache,
    current: GameWorld,
    frontier: GameWorld,
    farthest_turn: Turn,
    target: PlaybackTarget,
    logs: LogFilter,
    winner: Option<TeamId>,
    profiler_files: Vec<ProfilerFile>,
}

impl Match {
    /// Creates a live match at turn 0 with an empty log.
    ///
    /// # Errors
    ///
    /// Returns a referential error if the initial bodies are inconsistent
    /// with the metadata.
    pub fn new(meta: Arc<Metadata>, initial: InitialState, config: ReplayConfig) -> Result<Self> {
        let world = GameWorld::from_initial(meta, initial)?;
        Self::from_log(DeltaLog::new(world), config)
    }

    /// Creates a match over an existing log, validating every record.
    ///
    /// The match starts paused at the log's first turn and keeps the log's
    /// closed state.
    ///
    /// # Errors
    ///
    /// Returns the first referential error found while replaying the log.
    pub fn from_log(log: DeltaLog, config: ReplayConfig) -> Result<Self> {
        let initial = Arc::clone(log.initial());
        let eager = config.cache_policy == CachePolicy::Eager;
        let mut cache = SnapshotCache::new(Arc::clone(&initial), config.stride());
        let mut frontier = GameWorld::clone(&initial);
        for record in log.iter() {
            frontier.apply_delta(record).map_err(|e| annotate(e, record.turn))?;
            if eager {
                cache.capture(&frontier);
            }
        }

        let mut logs = LogFilter::new();
        logs.rebuild(initial.metadata(), &log);

        debug!(
            records = log.len(),
            closed = log.is_closed(),
            stride = cache.stride(),
            "loaded match"
        );
        Ok(Self {
            target: PlaybackTarget::Turn(initial.turn()),
            farthest_turn: if eager { frontier.turn() } else { initial.turn() },
            current: GameWorld::clone(&initial),
            config,
            log,
            cache,
            frontier,
            logs,
            winner: None,
            profiler_files: Vec::new(),
        })
    }

    /// Creates a match from a decoded container. A footer closes the log.
    ///
    /// # Errors
    ///
    /// Returns the first referential error in the header or the deltas.
    pub fn from_decoded(decoded: DecodedMatch, config: ReplayConfig) -> Result<Self> {
        let mut game = Self::from_header(decoded.header, config)?;
        for record in decoded.deltas {
            game.push_delta(record)?;
        }
        if let Some(footer) = decoded.footer {
            game.apply_footer(footer)?;
        }
        Ok(game)
    }

    /// Creates a live match from a decoded header frame.
    ///
    /// # Errors
    ///
    /// Returns a referential error if the initial bodies are inconsistent
    /// with the metadata.
    pub fn from_header(header: MatchHeader, config: ReplayConfig) -> Result<Self> {
        Self::new(Arc::new(header.metadata), header.initial, config)
    }

    /// Starts a live match from a stream decoder and ingests whatever
    /// follows the header. Returns `None` until the header has arrived.
    ///
    /// # Errors
    ///
    /// Returns the decoder's protocol errors, a decode error if the decoder
    /// has already handed out its header, or the first rejected record.
    pub fn from_stream(decoder: &mut StreamDecoder, config: ReplayConfig) -> Result<Option<Self>> {
        let Some(frame) = decoder.next_frame()? else {
            return Ok(None);
        };
        let Frame::Header(header) = frame else {
            return Err(Error::decode(format!(
                "expected match header frame, found {}; game containers load as a game",
                frame.kind_name()
            )));
        };
        let mut game = Self::from_header(header, config)?;
        game.ingest(decoder)?;
        Ok(Some(game))
    }

    /// Pulls every complete frame out of `decoder` into this match.
    ///
    /// Returns the number of delta records ingested.
    ///
    /// # Errors
    ///
    /// Returns the decoder's protocol errors, a decode error for a second
    /// header or a game frame, or the first rejected record or footer.
    pub fn ingest(&mut self, decoder: &mut StreamDecoder) -> Result<usize> {
        let mut ingested = 0;
        while let Some(frame) = decoder.next_frame()? {
            match frame {
                Frame::Delta(record) => {
                    self.push_delta(record)?;
                    ingested += 1;
                }
                Frame::Footer(footer) => self.apply_footer(footer)?,
                other => {
                    return Err(Error::decode(format!(
                        "{} frame for a match already loaded",
                        other.kind_name()
                    )));
                }
            }
        }
        Ok(ingested)
    }

    /// Appends a record to a live log.
    ///
    /// The record is applied to the frontier world first; if that fails the
    /// log and every world are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `OutOfSequence` unless the record continues the log, a
    /// referential error if it does not apply, or a decode error if the log
    /// is closed.
    pub fn push_delta(&mut self, record: DeltaRecord) -> Result<()> {
        if self.log.is_closed() {
            warn!(turn = record.turn, "rejected delta for closed match");
            return Err(annotate(
                Error::decode("delta arrived after the match was closed"),
                record.turn,
            ));
        }
        let expected = self.log.last_turn() + 1;
        if record.turn != expected {
            warn!(expected, actual = record.turn, "rejected out of sequence delta");
            return Err(Error::out_of_sequence(expected, record.turn));
        }
        if let Err(err) = self.frontier.apply_delta(&record) {
            warn!(turn = record.turn, %err, "rejected delta");
            return Err(annotate(err, record.turn));
        }

        if self.config.cache_policy == CachePolicy::Eager {
            self.cache.capture(&self.frontier);
            self.farthest_turn = self.frontier.turn();
        }
        self.logs.ingest(self.frontier.metadata(), &record);
        self.log.push(record)
    }

    /// Closes the match from its footer, keeping the declared winner and
    /// the profiler recordings.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the footer's turn count disagrees with the
    /// log or a profiler file is malformed. The match stays open.
    pub fn apply_footer(&mut self, footer: MatchFooter) -> Result<()> {
        let last = self.log.last_turn();
        if footer.total_turns != last {
            return Err(Error::decode(format!(
                "footer reports {} turns but the log holds {last}",
                footer.total_turns
            )));
        }
        for file in &footer.profiler_files {
            file.check()?;
        }
        self.profiler_files = footer.profiler_files;
        self.close(footer.winner);
        Ok(())
    }

    /// Marks the log final. A pending target past the last turn is clamped.
    pub fn close(&mut self, winner: Option<TeamId>) {
        self.log.close();
        self.winner = winner.or_else(|| self.frontier.winner());
        let last = self.log.last_turn();
        if matches!(self.target, PlaybackTarget::Turn(turn) if turn > last) {
            self.target = PlaybackTarget::Turn(last);
        }
        debug!(last_turn = last, winner = ?self.winner, "match closed");
    }

    // -------------------------------------------------------------------------
    // Seeking
    // -------------------------------------------------------------------------

    /// Moves the current world to `turn`, replaying synchronously as far as
    /// the log allows. Returns the turn reached.
    ///
    /// On a live log a target past the last record stays pending and
    /// [`compute`](Self::compute) finishes the job as records arrive. Turns
    /// before the log's first turn clamp to it.
    ///
    /// # Errors
    ///
    /// Returns `SeekOutOfRange` if the log is closed and `turn` is past its
    /// last turn. The current world is left unchanged.
    pub fn seek(&mut self, turn: Turn) -> Result<Turn> {
        let last = self.log.last_turn();
        if self.log.is_closed() && turn > last {
            return Err(Error::seek_out_of_range(turn, last));
        }
        let turn = turn.max(self.first_turn());
        self.target = PlaybackTarget::Turn(turn);

        let reachable = turn.min(last);
        if reachable != self.current.turn() {
            debug!(from = self.current.turn(), to = reachable, requested = turn, "seek");
            self.move_to(reachable);
        }
        Ok(self.current.turn())
    }

    /// Seeks to the last turn currently in the log.
    ///
    /// # Errors
    ///
    /// Never fails in practice; shares `seek`'s signature.
    pub fn seek_end(&mut self) -> Result<Turn> {
        self.seek(self.log.last_turn())
    }

    /// Plays toward the end of the log, following it as it grows.
    pub fn play(&mut self) {
        self.target = PlaybackTarget::End;
    }

    /// Holds playback at the current turn.
    pub fn pause(&mut self) {
        self.target = PlaybackTarget::Turn(self.current.turn());
    }

    fn move_to(&mut self, turn: Turn) {
        let from = self.current.turn();
        let restore = if turn < from {
            self.cache.nearest_at_or_before(turn)
        } else {
            self.cache.nearest_between(from, turn)
        };
        if let Some((cached, snapshot)) = restore {
            debug!(turn = cached, "restored snapshot");
            self.current = GameWorld::clone(snapshot);
        }
        while self.current.turn() < turn && self.step_forward() {}
    }

    fn step_forward(&mut self) -> bool {
        let next = self.current.turn() + 1;
        let Some(record) = self.log.get(next) else {
            return false;
        };
        // Every record was applied to the frontier on ingest.
        if let Err(err) = self.current.apply_delta(record) {
            error!(turn = next, %err, "validated record failed to replay");
            return false;
        }
        trace!(turn = next, bodies = self.current.body_count(), "replayed");
        self.farthest_turn = self.farthest_turn.max(next);
        self.cache.capture(&self.current);
        true
    }

    // -------------------------------------------------------------------------
    // Bounded compute
    // -------------------------------------------------------------------------

    /// Advances toward the target for at most `budget` of wall-clock time.
    pub fn compute(&mut self, budget: Duration) -> ComputeReport {
        self.compute_with(budget, &mut SystemClock::new())
    }

    /// Advances toward the target using the configured frame budget.
    pub fn compute_frame(&mut self) -> ComputeReport {
        self.compute(self.config.frame_budget)
    }

    /// Advances toward the target one record at a time, reading `clock`
    /// before each record.
    ///
    /// Overshoots the budget by at most one record. A zero budget applies
    /// nothing.
    pub fn compute_with<C: Clock + ?Sized>(
        &mut self,
        budget: Duration,
        clock: &mut C,
    ) -> ComputeReport {
        let start = clock.now();
        let mut applied = 0;
        let mut elapsed;

        let status = loop {
            elapsed = clock.now().saturating_sub(start);
            let turn = self.current.turn();
            let last = self.log.last_turn();
            let reached = match self.target {
                PlaybackTarget::Turn(target) => turn >= target,
                PlaybackTarget::End => turn >= last && self.log.is_closed(),
            };
            if reached {
                break if applied == 0 {
                    ComputeStatus::Idle
                } else {
                    ComputeStatus::ReachedTarget
                };
            }
            if turn >= last {
                break ComputeStatus::AwaitingRecords;
            }
            if elapsed >= budget {
                break ComputeStatus::BudgetExhausted;
            }
            if !self.step_forward() {
                break ComputeStatus::Stalled;
            }
            applied += 1;
        };

        let report = ComputeReport {
            applied,
            elapsed,
            turn: self.current.turn(),
            status,
        };
        if applied > 0 {
            trace!(%report, "compute");
        }
        report
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The world at the current turn. Valid until the next mutating call.
    #[must_use]
    pub fn current(&self) -> &GameWorld {
        &self.current
    }

    /// Turn of the current world.
    #[must_use]
    pub const fn current_turn(&self) -> Turn {
        self.current.turn()
    }

    /// Highest turn consumed into the current world or the snapshot cache.
    ///
    /// Under [`CachePolicy::Eager`] every ingested record feeds the cache, so
    /// this is the last turn of the log.
    #[must_use]
    pub const fn farthest_turn(&self) -> Turn {
        self.farthest_turn
    }

    /// Turn of the log's starting world.
    #[must_use]
    pub fn first_turn(&self) -> Turn {
        self.log.initial().turn()
    }

    /// Turn of the newest record.
    #[must_use]
    pub fn last_turn(&self) -> Turn {
        self.log.last_turn()
    }

    /// Where playback is heading.
    #[must_use]
    pub const fn target(&self) -> PlaybackTarget {
        self.target
    }

    /// Returns true if the target lies past the end of the log.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        match self.target {
            PlaybackTarget::Turn(turn) => turn > self.log.last_turn(),
            PlaybackTarget::End => !self.log.is_closed(),
        }
    }

    /// Returns true once the log is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.log.is_closed()
    }

    /// Returns true if the log is closed and the current world is at its
    /// last turn.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.log.is_closed() && self.current.turn() == self.log.last_turn()
    }

    /// The declared winner, or the winner recorded by the newest delta.
    #[must_use]
    pub fn winner(&self) -> Option<TeamId> {
        self.winner.or_else(|| self.frontier.winner())
    }

    /// Match metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        self.current.metadata()
    }

    /// The delta log.
    #[must_use]
    pub fn log(&self) -> &DeltaLog {
        &self.log
    }

    /// Profiler recordings from the footer, usually one per team. Empty
    /// until the match is closed by a footer that carries them.
    #[must_use]
    pub fn profiler_files(&self) -> &[ProfilerFile] {
        &self.profiler_files
    }

    /// Log entries indexed so far.
    #[must_use]
    pub fn logs(&self) -> &LogFilter {
        &self.logs
    }

    /// Turns with a cached snapshot, ascending.
    pub fn cached_turns(&self) -> impl Iterator<Item = Turn> + '_ {
        self.cache.turns()
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }
}

fn annotate(err: Error, turn: Turn) -> Error {
    if err.context.is_some() {
        return err;
    }
    err.with_context(ErrorContext::new().with_turn(turn).with_frame("delta ingest"))
}
