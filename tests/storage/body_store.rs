//! Body store integration tests
//!
//! Tests insertion, swap-remove, field updates, and column access.

use playback_foundation::{BodyTypeId, EntityId, ErrorCategory, ErrorKind, TeamId};
use playback_storage::{BodyField, BodyRow, BodyStore};

fn row(id: u32, ty: u8) -> BodyRow {
    BodyRow::new(EntityId::new(id), TeamId::new(1), BodyTypeId::new(ty), id as i32, 0)
}

// =============================================================================
// Insert and Remove
// =============================================================================

#[test]
fn insert_then_get() {
    let mut store = BodyStore::new();
    store.insert(row(5, 0).with_influence(40)).unwrap();

    let body = store.get(EntityId::new(5)).unwrap();
    assert_eq!(body.influence(), 40);
    assert_eq!(body.position(), (5, 0));
    assert_eq!(body.to_row(), row(5, 0).with_influence(40));
}

#[test]
fn duplicate_insert_rejected() {
    let mut store = BodyStore::new();
    store.insert(row(5, 0)).unwrap();
    let err = store.insert(row(5, 1)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateId(_)));
    assert_eq!(store.get(EntityId::new(5)).unwrap().body_type(), BodyTypeId::new(0));
}

#[test]
fn unindexable_id_rejected() {
    let mut store = BodyStore::new();
    let err = store
        .insert(row(EntityId::MAX_INDEXED + 1, 0))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IdOutOfRange(_)));
    assert!(store.is_empty());
}

#[test]
fn remove_swaps_last_row_into_hole() {
    let mut store = BodyStore::new();
    for id in 1..=4 {
        store.insert(row(id, 0)).unwrap();
    }

    let removed = store.remove(EntityId::new(2)).unwrap();
    assert_eq!(removed.id, EntityId::new(2));
    assert_eq!(store.len(), 3);

    // Every survivor is still found at the row the index claims.
    for &id in store.ids() {
        let at = store.row_of(id).unwrap().get();
        assert_eq!(store.ids()[at], id);
    }
    assert!(!store.contains(EntityId::new(2)));
}

#[test]
fn absent_id_is_lookup_error() {
    let mut store = BodyStore::new();
    let err = store.remove(EntityId::new(1)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Lookup);
    assert!(store.get(EntityId::new(1)).is_err());
    assert!(
        store
            .set_field(EntityId::new(1), BodyField::X, 3)
            .is_err()
    );
}

// =============================================================================
// Fields and Iteration
// =============================================================================

#[test]
fn set_field_updates_column() {
    let mut store = BodyStore::new();
    store.insert(row(1, 0)).unwrap();
    store.set_field(EntityId::new(1), BodyField::Conviction, 17).unwrap();
    store.set_field(EntityId::new(1), BodyField::Y, -3).unwrap();

    assert_eq!(store.convictions(), &[17]);
    assert_eq!(store.ys(), &[-3]);
}

#[test]
fn team_field_must_fit_u8() {
    let mut store = BodyStore::new();
    store.insert(row(1, 0)).unwrap();
    let err = store
        .set_field(EntityId::new(1), BodyField::Team, 300)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidFieldValue { value: 300, .. }));
}

#[test]
fn iter_of_type_is_restartable() {
    let mut store = BodyStore::new();
    for id in 0..10 {
        store.insert(row(id, (id % 3) as u8)).unwrap();
    }

    let politicians = store.iter_of_type(BodyTypeId::new(1));
    let first: Vec<_> = politicians.clone().map(|b| b.id()).collect();
    let second: Vec<_> = politicians.map(|b| b.id()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn columns_stay_parallel() {
    let mut store = BodyStore::with_capacity(16);
    for id in 0..16 {
        store.insert(row(id, 0)).unwrap();
    }
    for id in (0..16).step_by(3) {
        store.remove(EntityId::new(id)).unwrap();
    }
    let n = store.len();
    assert_eq!(store.teams().len(), n);
    assert_eq!(store.xs().len(), n);
    assert_eq!(store.flags().len(), n);
    assert_eq!(store.bytecodes_used().len(), n);
    assert_eq!(store.iter().count(), n);

    store.clear();
    assert!(store.is_empty());
    assert!(!store.contains(EntityId::new(1)));
}
