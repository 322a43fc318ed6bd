//! Delta log integration tests
//!
//! Tests append ordering, closing, and cheap sharing.

use std::sync::Arc;

use playback_foundation::{ErrorKind, Turn};
use playback_storage::{DeltaLog, DeltaRecord, GameWorld, MapInfo, Metadata};

fn log_with(turns: Turn) -> DeltaLog {
    let world = GameWorld::new(Arc::new(Metadata::new()), MapInfo::new("m", (0, 0), 2, 2));
    let mut log = DeltaLog::new(world);
    for turn in 1..=turns {
        log.push(DeltaRecord::new(turn)).unwrap();
    }
    log
}

#[test]
fn records_are_addressed_by_turn() {
    let log = log_with(5);
    assert_eq!(log.last_turn(), 5);
    assert_eq!(log.len(), 5);
    for turn in 1..=5 {
        assert_eq!(log.get(turn).unwrap().turn, turn);
    }
    assert_eq!(log.iter().map(|r| r.turn).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn duplicate_turn_rejected() {
    let mut log = log_with(2);
    let err = log.push(DeltaRecord::new(2)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::OutOfSequence { expected: 3, actual: 2 }));
}

#[test]
fn clones_share_records() {
    let mut log = log_with(3);
    let reader = log.clone();
    log.push(DeltaRecord::new(4)).unwrap();

    assert_eq!(reader.last_turn(), 3);
    assert_eq!(log.last_turn(), 4);
    assert!(Arc::ptr_eq(reader.get(2).unwrap(), log.get(2).unwrap()));
}

#[test]
fn close_is_final() {
    let mut log = log_with(1);
    assert!(!log.is_closed());
    log.close();
    assert!(log.is_closed());
    assert!(log.push(DeltaRecord::new(2)).is_err());
    assert_eq!(log.last_turn(), 1);
}
