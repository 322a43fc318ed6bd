//! Seek integration tests
//!
//! Tests determinism, idempotence, and range handling of `seek`.

use playback_foundation::{EntityId, ErrorCategory};
use playback_replay::{CachePolicy, LogQuery, ReplayConfig};
use playback_storage::TeamStat;

use crate::{BLUE, RED, closed_match, reference_worlds};

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn every_turn_matches_sequential_replay() {
    let worlds = reference_worlds(80);
    let mut game = closed_match(80, ReplayConfig::new().with_snapshot_stride(16));
    for turn in (0..=80).rev() {
        game.seek(turn).unwrap();
        assert_eq!(game.current(), &worlds[turn as usize], "turn {turn}");
    }
}

#[test]
fn access_pattern_does_not_matter() {
    let worlds = reference_worlds(60);
    let configs = [
        ReplayConfig::default(),
        ReplayConfig::new().with_snapshot_stride(1),
        ReplayConfig::new().with_snapshot_stride(7),
        ReplayConfig::fast_seek(),
        ReplayConfig::low_memory(),
    ];
    let path = [33, 12, 59, 0, 41, 40, 17, 60, 5, 33];
    for config in configs {
        let mut game = closed_match(60, config);
        for turn in path {
            assert_eq!(game.seek(turn).unwrap(), turn);
            assert_eq!(game.current(), &worlds[turn as usize]);
        }
    }
}

#[test]
fn backward_seek_restores_removed_bodies() {
    let mut game = closed_match(40, ReplayConfig::new().with_snapshot_stride(8));
    let scout = EntityId::new(1005);

    game.seek(20).unwrap();
    assert!(game.current().body(scout).is_err());
    assert_eq!(game.current().removed_this_turn().len(), 0);

    game.seek(17).unwrap();
    assert!(game.current().body(scout).is_err());
    assert_eq!(game.current().removed_this_turn().len(), 2);

    game.seek(9).unwrap();
    assert_eq!(game.current().body(scout).unwrap().position(), (7, 7));
    assert_eq!(game.farthest_turn(), 20);
}

#[test]
fn seek_twice_changes_nothing() {
    let mut game = closed_match(30, ReplayConfig::default());
    game.seek(22).unwrap();
    let snapshot = game.current().clone();
    let cached: Vec<_> = game.cached_turns().collect();

    game.seek(22).unwrap();
    assert_eq!(game.current(), &snapshot);
    assert_eq!(game.cached_turns().collect::<Vec<_>>(), cached);
}

// =============================================================================
// Range and Cache
// =============================================================================

#[test]
fn seek_past_end_is_recoverable() {
    let mut game = closed_match(30, ReplayConfig::default());
    game.seek(10).unwrap();
    let err = game.seek(31).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Range);

    // Clamping and retrying works.
    assert_eq!(game.seek(game.last_turn()).unwrap(), 30);
    assert!(game.is_finished());
}

#[test]
fn eager_policy_caches_before_playback() {
    let game = closed_match(
        50,
        ReplayConfig::new()
            .with_snapshot_stride(10)
            .with_cache_policy(CachePolicy::Eager),
    );
    assert_eq!(
        game.cached_turns().collect::<Vec<_>>(),
        vec![0, 10, 20, 30, 40, 50]
    );
    assert_eq!(game.current_turn(), 0);
    assert_eq!(game.farthest_turn(), 50);
}

// =============================================================================
// Stats and Logs
// =============================================================================

#[test]
fn stats_follow_seek() {
    let mut game = closed_match(30, ReplayConfig::default());
    game.seek(25).unwrap();
    let stats = game.current().team_stats(BLUE).unwrap();
    assert_eq!(stats.get(TeamStat::Income), 50);

    game.seek(3).unwrap();
    let stats = game.current().team_stats(RED).unwrap();
    assert_eq!(stats.get(TeamStat::Income), 3);
}

#[test]
fn logs_are_indexed_for_the_whole_log() {
    let game = closed_match(30, ReplayConfig::default());
    let logs = game.logs();
    assert_eq!(logs.len(), 12);
    assert_eq!(logs.entries_for_turn(10).count(), 2);
    assert_eq!(logs.entries_for_entity(EntityId::new(2)).count(), 6);

    let query = LogQuery::new().with_team(RED).with_turns(11..=25);
    let texts: Vec<_> = logs
        .entries_matching(&query)
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(texts, vec!["spawned 1015", "spawned 1020", "spawned 1025"]);
}
