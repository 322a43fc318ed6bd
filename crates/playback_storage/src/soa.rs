//! Columnar ("struct of arrays") storage for live bodies.
//!
//! Each field lives in its own contiguous column; all columns share the
//! same length, which is the live body count. A dense table maps an id to
//! its row. Removal swaps the last row into the freed slot, so row order
//! carries no meaning and only id-addressed lookup is stable.
//!
//! ```text
//! index:  [-, -, 2, -, 0, 1]     ids:  [#4, #5, #2]
//!                                xs:   [ 3,  8,  1]
//!                                ys:   [ 0,  2,  6]
//! ```

// Row counts are bounded by EntityId::MAX_INDEXED, which fits in u32.
#![allow(clippy::cast_possible_truncation)]

use playback_foundation::{BodyTypeId, EntityId, Error, ErrorKind, Result, TeamId};

use crate::body::{BodyField, BodyRow};

/// Position of a row in the store's columns.
///
/// Only valid until the next insert or removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowIndex(u32);

impl RowIndex {
    const fn new(row: usize) -> Self {
        Self(row as u32)
    }

    /// Returns the row as a column offset.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

/// Columnar store of live bodies keyed by [`EntityId`].
///
/// The id table is as long as the largest live id plus one, at 8 bytes a
/// slot, and cloning the store copies it with the columns. A world whose
/// ids reach [`EntityId::MAX_INDEXED`] carries a 32 MiB table into every
/// snapshot. Removing the highest live id shrinks the table back to the
/// next live id.
#[derive(Clone, Debug, Default)]
pub struct BodyStore {
    ids: Vec<EntityId>,
    teams: Vec<TeamId>,
    types: Vec<BodyTypeId>,
    xs: Vec<i32>,
    ys: Vec<i32>,
    influence: Vec<i32>,
    conviction: Vec<i32>,
    flags: Vec<i32>,
    bytecodes: Vec<i32>,
    /// Dense id -> row table. `index[id] == Some(i)` iff `ids[i] == id`.
    index: Vec<Option<RowIndex>>,
}

impl BodyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` bodies.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            teams: Vec::with_capacity(capacity),
            types: Vec::with_capacity(capacity),
            xs: Vec::with_capacity(capacity),
            ys: Vec::with_capacity(capacity),
            influence: Vec::with_capacity(capacity),
            conviction: Vec::with_capacity(capacity),
            flags: Vec::with_capacity(capacity),
            bytecodes: Vec::with_capacity(capacity),
            index: Vec::new(),
        }
    }

    /// Returns the number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no bodies are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns true if a body with this id is live.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.row_of(id).is_some()
    }

    /// Returns the row currently holding `id`.
    #[must_use]
    pub fn row_of(&self, id: EntityId) -> Option<RowIndex> {
        self.index.get(id.index()).copied().flatten()
    }

    /// Appends a new row.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the id is already live, or `IdOutOfRange`
    /// if the id is too large for the id table.
    pub fn insert(&mut self, row: BodyRow) -> Result<RowIndex> {
        if !row.id.is_indexable() {
            return Err(Error::new(ErrorKind::IdOutOfRange(row.id)));
        }
        let slot = row.id.index();
        if slot >= self.index.len() {
            self.index.resize(slot + 1, None);
        }
        if self.index[slot].is_some() {
            return Err(Error::duplicate_id(row.id));
        }

        let at = RowIndex::new(self.ids.len());
        self.ids.push(row.id);
        self.teams.push(row.team);
        self.types.push(row.body_type);
        self.xs.push(row.x);
        self.ys.push(row.y);
        self.influence.push(row.influence);
        self.conviction.push(row.conviction);
        self.flags.push(row.flag);
        self.bytecodes.push(row.bytecodes_used);
        self.index[slot] = Some(at);
        Ok(at)
    }

    /// Removes the body with `id` and returns its row.
    ///
    /// The last row moves into the freed slot.
    ///
    /// # Errors
    ///
    /// Returns `UnknownId` if no body with this id is live.
    pub fn remove(&mut self, id: EntityId) -> Result<BodyRow> {
        let at = self.row_of(id).ok_or_else(|| Error::unknown_id(id))?;
        let removed = self.row_at(at);
        let row = at.get();

        self.ids.swap_remove(row);
        self.teams.swap_remove(row);
        self.types.swap_remove(row);
        self.xs.swap_remove(row);
        self.ys.swap_remove(row);
        self.influence.swap_remove(row);
        self.conviction.swap_remove(row);
        self.flags.swap_remove(row);
        self.bytecodes.swap_remove(row);

        self.index[id.index()] = None;
        if let Some(&moved) = self.ids.get(row) {
            self.index[moved.index()] = Some(at);
        }
        while self.index.last() == Some(&None) {
            self.index.pop();
        }
        Ok(removed)
    }

    /// Returns a view of the body with `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownId` if no body with this id is live.
    pub fn get(&self, id: EntityId) -> Result<BodyRef<'_>> {
        self.row_of(id)
            .map(|row| BodyRef { store: self, row })
            .ok_or_else(|| Error::unknown_id(id))
    }

    /// Overwrites one field of the body with `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownId` if no body with this id is live, or
    /// `InvalidFieldValue` if a team or body type value does not fit a `u8`.
    pub fn set_field(&mut self, id: EntityId, field: BodyField, value: i32) -> Result<()> {
        let row = self.row_of(id).ok_or_else(|| Error::unknown_id(id))?.get();
        match field {
            BodyField::Team => self.teams[row] = TeamId::new(narrow(field, value)?),
            BodyField::BodyType => self.types[row] = BodyTypeId::new(narrow(field, value)?),
            BodyField::X => self.xs[row] = value,
            BodyField::Y => self.ys[row] = value,
            BodyField::Influence => self.influence[row] = value,
            BodyField::Conviction => self.conviction[row] = value,
            BodyField::Flag => self.flags[row] = value,
            BodyField::BytecodesUsed => self.bytecodes[row] = value,
        }
        Ok(())
    }

    /// Removes every body. The id table keeps its allocation.
    pub fn clear(&mut self) {
        self.index.clear();
        self.ids.clear();
        self.teams.clear();
        self.types.clear();
        self.xs.clear();
        self.ys.clear();
        self.influence.clear();
        self.conviction.clear();
        self.flags.clear();
        self.bytecodes.clear();
    }

    /// Iterates all live bodies in row order.
    pub fn iter(&self) -> impl Iterator<Item = BodyRef<'_>> + Clone + '_ {
        (0..self.len()).map(move |row| BodyRef {
            store: self,
            row: RowIndex::new(row),
        })
    }

    /// Iterates live bodies of one type in row order.
    ///
    /// The iterator is lazy and can be cloned to restart the scan.
    pub fn iter_of_type(
        &self,
        body_type: BodyTypeId,
    ) -> impl Iterator<Item = BodyRef<'_>> + Clone + '_ {
        self.types
            .iter()
            .enumerate()
            .filter(move |(_, ty)| **ty == body_type)
            .map(move |(row, _)| BodyRef {
                store: self,
                row: RowIndex::new(row),
            })
    }

    /// Copies the row at `at` out of the columns.
    fn row_at(&self, at: RowIndex) -> BodyRow {
        let row = at.get();
        BodyRow {
            id: self.ids[row],
            team: self.teams[row],
            body_type: self.types[row],
            x: self.xs[row],
            y: self.ys[row],
            influence: self.influence[row],
            conviction: self.conviction[row],
            flag: self.flags[row],
            bytecodes_used: self.bytecodes[row],
        }
    }

    /// Id column.
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Team column.
    #[must_use]
    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }

    /// Body type column.
    #[must_use]
    pub fn body_types(&self) -> &[BodyTypeId] {
        &self.types
    }

    /// X column.
    #[must_use]
    pub fn xs(&self) -> &[i32] {
        &self.xs
    }

    /// Y column.
    #[must_use]
    pub fn ys(&self) -> &[i32] {
        &self.ys
    }

    /// Influence column.
    #[must_use]
    pub fn influences(&self) -> &[i32] {
        &self.influence
    }

    /// Conviction column.
    #[must_use]
    pub fn convictions(&self) -> &[i32] {
        &self.conviction
    }

    /// Flag column.
    #[must_use]
    pub fn flags(&self) -> &[i32] {
        &self.flags
    }

    /// Bytecodes-used column.
    #[must_use]
    pub fn bytecodes_used(&self) -> &[i32] {
        &self.bytecodes
    }
}

/// Converts a team or body type field value to its column width.
pub(crate) fn narrow(field: BodyField, value: i32) -> Result<u8> {
    u8::try_from(value).map_err(|_| {
        Error::new(ErrorKind::InvalidFieldValue {
            field: field.name().to_string(),
            value,
        })
    })
}

// The id table is derived from the id column, so two stores are equal when
// their columns are.
impl PartialEq for BodyStore {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
            && self.teams == other.teams
            && self.types == other.types
            && self.xs == other.xs
            && self.ys == other.ys
            && self.influence == other.influence
            && self.conviction == other.conviction
            && self.flags == other.flags
            && self.bytecodes == other.bytecodes
    }
}

impl Eq for BodyStore {}

/// Borrowed view of one row of a [`BodyStore`].
#[derive(Clone, Copy)]
pub struct BodyRef<'a> {
    store: &'a BodyStore,
    row: RowIndex,
}

impl BodyRef<'_> {
    /// Row this view points at.
    #[must_use]
    pub const fn row(&self) -> RowIndex {
        self.row
    }

    /// Body id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.store.ids[self.row.get()]
    }

    /// Owning team.
    #[must_use]
    pub fn team(&self) -> TeamId {
        self.store.teams[self.row.get()]
    }

    /// Body type.
    #[must_use]
    pub fn body_type(&self) -> BodyTypeId {
        self.store.types[self.row.get()]
    }

    /// X coordinate.
    #[must_use]
    pub fn x(&self) -> i32 {
        self.store.xs[self.row.get()]
    }

    /// Y coordinate.
    #[must_use]
    pub fn y(&self) -> i32 {
        self.store.ys[self.row.get()]
    }

    /// `(x, y)`.
    #[must_use]
    pub fn position(&self) -> (i32, i32) {
        (self.x(), self.y())
    }

    /// Influence.
    #[must_use]
    pub fn influence(&self) -> i32 {
        self.store.influence[self.row.get()]
    }

    /// Conviction.
    #[must_use]
    pub fn conviction(&self) -> i32 {
        self.store.conviction[self.row.get()]
    }

    /// Flag.
    #[must_use]
    pub fn flag(&self) -> i32 {
        self.store.flags[self.row.get()]
    }

    /// Bytecodes used last turn.
    #[must_use]
    pub fn bytecodes_used(&self) -> i32 {
        self.store.bytecodes[self.row.get()]
    }

    /// Reads a field as an `i32`.
    #[must_use]
    pub fn field(&self, field: BodyField) -> i32 {
        self.to_row().field(field)
    }

    /// Copies the row out.
    #[must_use]
    pub fn to_row(&self) -> BodyRow {
        self.store.row_at(self.row)
    }
}

impl std::fmt::Debug for BodyRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyRef")
            .field("row", &self.row)
            .field("body", &self.to_row())
            .finish()
    }
}
