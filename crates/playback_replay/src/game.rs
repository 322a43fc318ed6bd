//! Several matches played on shared metadata.
//!
//! A [`Game`] owns one `Arc<Metadata>` and hands it to every [`Match`] it
//! starts, so a best-of-N recording shares team and body type tables across
//! its matches. Only the newest match can be live; a match must be closed
//! before the next one starts.

use std::collections::BTreeMap;
use std::sync::Arc;

use playback_foundation::{Error, ErrorContext, Result, TeamId};
use playback_storage::{InitialState, Metadata};
use playback_wire::{DecodedGame, Frame, GameHeader, StreamDecoder};
use tracing::debug;

use crate::config::ReplayConfig;
use crate::controller::Match;

/// Replay controller for a game of one or more matches.
#[derive(Clone, Debug)]
pub struct Game {
    config: ReplayConfig,
    metadata: Arc<Metadata>,
    matches: Vec<Match>,
    winner: Option<TeamId>,
    closed: bool,
}

impl Game {
    /// Creates an open game with no matches.
    #[must_use]
    pub fn new(metadata: Arc<Metadata>, config: ReplayConfig) -> Self {
        Self {
            config,
            metadata,
            matches: Vec::new(),
            winner: None,
            closed: false,
        }
    }

    /// Creates an open game from a decoded game header.
    #[must_use]
    pub fn from_header(header: GameHeader, config: ReplayConfig) -> Self {
        Self::new(Arc::new(header.metadata), config)
    }

    /// Creates a game from a decoded container. A game footer closes it.
    ///
    /// # Errors
    ///
    /// Returns the first rejected initial state, record, or footer, with the
    /// match index in the error context.
    pub fn from_decoded(decoded: DecodedGame, config: ReplayConfig) -> Result<Self> {
        let mut game = Self::from_header(decoded.header, config);
        for (index, recorded) in decoded.matches.into_iter().enumerate() {
            let current = game.start_match(recorded.initial)?;
            for record in recorded.deltas {
                current.push_delta(record).map_err(|e| in_match(e, index))?;
            }
            if let Some(footer) = recorded.footer {
                current.apply_footer(footer).map_err(|e| in_match(e, index))?;
            }
        }
        if let Some(footer) = decoded.footer {
            game.close(footer.winner)?;
        }
        Ok(game)
    }

    /// Starts a live game from a stream decoder and ingests whatever follows
    /// the game header. Returns `None` until the header has arrived.
    ///
    /// # Errors
    ///
    /// Returns the decoder's protocol errors, a decode error if the stream
    /// holds a single match, or the first rejected frame.
    pub fn from_stream(decoder: &mut StreamDecoder, config: ReplayConfig) -> Result<Option<Self>> {
        let Some(frame) = decoder.next_frame()? else {
            return Ok(None);
        };
        let Frame::GameHeader(header) = frame else {
            return Err(Error::decode(format!(
                "expected game header frame, found {}",
                frame.kind_name()
            )));
        };
        let mut game = Self::from_header(header, config);
        game.ingest(decoder)?;
        Ok(Some(game))
    }

    /// Pulls every complete frame out of `decoder` into this game.
    ///
    /// Returns the number of delta records ingested across all matches.
    ///
    /// # Errors
    ///
    /// Returns the decoder's protocol errors, a decode error for a frame
    /// that does not fit the game's state, or the first rejected record.
    pub fn ingest(&mut self, decoder: &mut StreamDecoder) -> Result<usize> {
        let mut ingested = 0;
        while let Some(frame) = decoder.next_frame()? {
            match frame {
                Frame::MatchStart(initial) => {
                    self.start_match(initial)?;
                }
                Frame::Delta(record) => {
                    let index = self.matches.len().saturating_sub(1);
                    self.live_match_mut()?
                        .push_delta(record)
                        .map_err(|e| in_match(e, index))?;
                    ingested += 1;
                }
                Frame::Footer(footer) => {
                    let index = self.matches.len().saturating_sub(1);
                    self.live_match_mut()?
                        .apply_footer(footer)
                        .map_err(|e| in_match(e, index))?;
                }
                Frame::GameFooter(footer) => self.close(footer.winner)?,
                Frame::Header(_) | Frame::GameHeader(_) => {
                    return Err(Error::decode("header frame for a game already loaded"));
                }
            }
        }
        Ok(ingested)
    }

    /// Begins the next match on the game's metadata.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the game is closed or the previous match is
    /// still live, or a referential error if the initial bodies do not fit
    /// the metadata.
    pub fn start_match(&mut self, initial: InitialState) -> Result<&mut Match> {
        let index = self.matches.len();
        if self.closed {
            return Err(Error::decode(format!(
                "match {index} started after the game was closed"
            )));
        }
        if self.live_match().is_some() {
            return Err(Error::decode(format!(
                "match {index} started while match {} is live",
                index - 1
            )));
        }
        let started = Match::new(Arc::clone(&self.metadata), initial, self.config.clone())
            .map_err(|e| in_match(e, index))?;
        debug!(index, "started match");
        self.matches.push(started);
        Ok(&mut self.matches[index])
    }

    /// Marks the game final.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the newest match is still live.
    pub fn close(&mut self, winner: Option<TeamId>) -> Result<()> {
        if self.live_match().is_some() {
            return Err(Error::decode(format!(
                "game closed while match {} is live",
                self.matches.len() - 1
            )));
        }
        self.closed = true;
        self.winner = winner;
        debug!(matches = self.matches.len(), winner = ?self.winner(), "game closed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Metadata shared by every match.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Matches in play order.
    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// The match at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Match> {
        self.matches.get(index)
    }

    /// The match at `index`, for seeking and compute.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Match> {
        self.matches.get_mut(index)
    }

    /// Number of matches started.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if no match has started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The newest match, if it is still receiving records.
    #[must_use]
    pub fn live_match(&self) -> Option<&Match> {
        self.matches.last().filter(|m| !m.is_closed())
    }

    /// Returns true once the game is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closed matches won by `team`.
    #[must_use]
    pub fn wins(&self, team: TeamId) -> usize {
        self.closed_winners().filter(|&t| t == team).count()
    }

    /// The declared winner, or else the team with the most closed match
    /// wins. A tie for most wins has no winner.
    #[must_use]
    pub fn winner(&self) -> Option<TeamId> {
        self.winner.or_else(|| {
            let mut wins: BTreeMap<TeamId, usize> = BTreeMap::new();
            for team in self.closed_winners() {
                *wins.entry(team).or_default() += 1;
            }
            let most = wins.values().copied().max()?;
            let mut leaders = wins.into_iter().filter(|&(_, n)| n == most);
            match (leaders.next(), leaders.next()) {
                (Some((team, _)), None) => Some(team),
                _ => None,
            }
        })
    }

    /// The configuration every match is started with.
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    fn closed_winners(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.matches
            .iter()
            .filter(|m| m.is_closed())
            .filter_map(Match::winner)
    }

    fn live_match_mut(&mut self) -> Result<&mut Match> {
        self.matches
            .last_mut()
            .filter(|m| !m.is_closed())
            .ok_or_else(|| Error::decode("match frame outside a live match"))
    }
}

/// Records which match an error came from, outermost in the context stack.
fn in_match(mut err: Error, index: usize) -> Error {
    let frame = format!("match {index}");
    if let Some(context) = &mut err.context {
        context.stack.insert(0, frame);
        return err;
    }
    err.with_context(ErrorContext::new().with_frame(frame))
}
