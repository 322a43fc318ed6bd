//! Per-turn body log entries, indexed by turn and by entity.
//!
//! Each delta record carries the text its bodies printed that turn. Lines of
//! the form `[A:TYPE#id@turn] text` start a new entry attributed to a body;
//! any other line continues the previous entry. Text before the first header
//! becomes an unattributed entry.

use std::collections::{BTreeMap, HashMap};
use std::ops::{Range, RangeInclusive};

use playback_foundation::{BodyTypeId, EntityId, TeamId, Turn};
use playback_storage::{DeltaLog, DeltaRecord, Metadata};

// =============================================================================
// Log Entry
// =============================================================================

/// One body's output for one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Turn of the record that carried the entry.
    pub turn: Turn,
    /// Team named by the header letter, if known.
    pub team: Option<TeamId>,
    /// Body type named by the header, if known.
    pub body_type: Option<BodyTypeId>,
    /// Body that emitted the entry.
    pub entity: Option<EntityId>,
    /// Entry text without the header. Continuation lines are joined with `\n`.
    pub text: String,
}

struct Header<'a> {
    team: Option<TeamId>,
    body_type: Option<BodyTypeId>,
    entity: EntityId,
    text: &'a str,
}

/// Parses `[A:TYPE#id@turn] text`. Returns `None` for anything else.
fn parse_header<'a>(meta: &Metadata, line: &'a str) -> Option<Header<'a>> {
    let rest = line.strip_prefix('[')?;
    let (inner, text) = rest.split_once(']')?;
    let (letter, rest) = inner.split_once(':')?;
    let (type_name, rest) = rest.split_once('#')?;
    let (id, turn) = rest.split_once('@')?;

    let mut chars = letter.chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let id: u32 = id.parse().ok()?;
    turn.parse::<Turn>().ok()?;

    Some(Header {
        team: meta.team_by_letter(letter).map(|t| t.id),
        body_type: meta.body_type_by_name(type_name).map(|s| s.id),
        entity: EntityId::new(id),
        text: text.strip_prefix(' ').unwrap_or(text),
    })
}

// =============================================================================
// Log Query
// =============================================================================

/// Combined filter for [`LogFilter::entries_matching`]. Unset fields match
/// everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Inclusive turn range.
    pub turns: Option<RangeInclusive<Turn>>,
    /// Emitting body.
    pub entity: Option<EntityId>,
    /// Emitting team.
    pub team: Option<TeamId>,
    /// Substring the text must contain.
    pub text: Option<String>,
}

impl LogQuery {
    /// Creates a query matching every entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to restrict to a single turn.
    #[must_use]
    pub fn with_turn(self, turn: Turn) -> Self {
        self.with_turns(turn..=turn)
    }

    /// Builder method to restrict to an inclusive turn range.
    #[must_use]
    pub fn with_turns(mut self, turns: RangeInclusive<Turn>) -> Self {
        self.turns = Some(turns);
        self
    }

    /// Builder method to restrict to one body.
    #[must_use]
    pub fn with_entity(mut self, id: EntityId) -> Self {
        self.entity = Some(id);
        self
    }

    /// Builder method to restrict to one team.
    #[must_use]
    pub fn with_team(mut self, team: TeamId) -> Self {
        self.team = Some(team);
        self
    }

    /// Builder method to require a substring.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Returns true if `entry` passes every set filter.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.turns.as_ref().is_none_or(|r| r.contains(&entry.turn))
            && self.entity.is_none_or(|id| entry.entity == Some(id))
            && self.team.is_none_or(|team| entry.team == Some(team))
            && self
                .text
                .as_deref()
                .is_none_or(|needle| entry.text.contains(needle))
    }
}

// =============================================================================
// Log Filter
// =============================================================================

/// Index of log entries by turn and by emitting entity.
///
/// Entries are kept in emission order. Records must be ingested in turn
/// order, which the delta log guarantees.
#[derive(Clone, Debug, Default)]
pub struct LogFilter {
    entries: Vec<LogEntry>,
    by_turn: BTreeMap<Turn, Range<usize>>,
    by_entity: HashMap<EntityId, Vec<usize>>,
}

impl LogFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits a record's log text into entries and indexes them.
    ///
    /// Returns the number of entries added.
    pub fn ingest(&mut self, meta: &Metadata, record: &DeltaRecord) -> usize {
        let start = self.entries.len();
        let mut pending: Option<LogEntry> = None;

        for line in record.logs.lines() {
            if let Some(header) = parse_header(meta, line) {
                if let Some(done) = pending.take() {
                    self.entries.push(done);
                }
                pending = Some(LogEntry {
                    turn: record.turn,
                    team: header.team,
                    body_type: header.body_type,
                    entity: Some(header.entity),
                    text: header.text.to_string(),
                });
            } else if let Some(entry) = pending.as_mut() {
                entry.text.push('\n');
                entry.text.push_str(line);
            } else if !line.trim().is_empty() {
                pending = Some(LogEntry {
                    turn: record.turn,
                    team: None,
                    body_type: None,
                    entity: None,
                    text: line.to_string(),
                });
            }
        }
        if let Some(done) = pending {
            self.entries.push(done);
        }

        let end = self.entries.len();
        if end > start {
            self.by_turn.insert(record.turn, start..end);
            for (index, entry) in self.entries[start..end].iter().enumerate() {
                if let Some(id) = entry.entity {
                    self.by_entity.entry(id).or_default().push(start + index);
                }
            }
        }
        end - start
    }

    /// Discards everything and re-indexes every record in `log`.
    pub fn rebuild(&mut self, meta: &Metadata, log: &DeltaLog) {
        self.clear();
        for record in log.iter() {
            self.ingest(meta, record);
        }
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_turn.clear();
        self.by_entity.clear();
    }

    /// Entries carried by the record for `turn`, in emission order.
    pub fn entries_for_turn(&self, turn: Turn) -> impl Iterator<Item = &LogEntry> + Clone {
        let range = self.by_turn.get(&turn).cloned().unwrap_or(0..0);
        self.entries[range].iter()
    }

    /// Entries emitted by `id` across all turns, in emission order.
    pub fn entries_for_entity(&self, id: EntityId) -> impl Iterator<Item = &LogEntry> + Clone {
        self.by_entity
            .get(&id)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .map(|&index| &self.entries[index])
    }

    /// Entries passing every filter in `query`, in emission order.
    pub fn entries_matching<'a>(
        &'a self,
        query: &'a LogQuery,
    ) -> impl Iterator<Item = &'a LogEntry> + Clone + 'a {
        let candidates = match &query.turns {
            Some(turns) if turns.is_empty() => &[][..],
            Some(turns) => {
                let mut spans = self.by_turn.range(turns.clone()).map(|(_, r)| r.clone());
                match spans.next() {
                    Some(first) => {
                        let end = spans.next_back().map_or(first.end, |last| last.end);
                        &self.entries[first.start..end]
                    }
                    None => &[][..],
                }
            }
            None => &self.entries[..],
        };
        candidates.iter().filter(move |entry| query.matches(entry))
    }
}
