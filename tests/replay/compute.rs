//! Bounded compute integration tests
//!
//! Tests that `compute` advances toward the target within its budget.

use std::time::Duration;

use playback_replay::{ComputeStatus, ManualClock, PlaybackTarget, ReplayConfig};

use crate::{closed_match, reference_worlds};

#[test]
fn overshoot_is_at_most_one_record() {
    let mut game = closed_match(100, ReplayConfig::default());
    game.play();

    // Each clock reading costs 1 ms, standing in for one record's work.
    let mut clock = ManualClock::new().with_step(Duration::from_millis(1));
    let budget = Duration::from_millis(10);
    let mut frames = 0;
    loop {
        let report = game.compute_with(budget, &mut clock);
        assert!(report.elapsed <= budget + Duration::from_millis(1));
        frames += 1;
        if report.status != ComputeStatus::BudgetExhausted {
            assert_eq!(report.status, ComputeStatus::ReachedTarget);
            break;
        }
        assert_eq!(report.applied, 9);
    }
    assert_eq!(frames, 12);
    assert!(game.is_finished());
}

#[test]
fn compute_reaches_seek_target_incrementally() {
    let worlds = reference_worlds(50);
    let mut game = closed_match(50, ReplayConfig::default());
    game.seek(10).unwrap();
    game.pause();

    assert_eq!(
        game.compute(Duration::from_secs(1)).status,
        ComputeStatus::Idle
    );

    game.play();
    let mut clock = ManualClock::new().with_step(Duration::from_millis(1));
    let report = game.compute_with(Duration::from_millis(4), &mut clock);
    assert_eq!(report.applied, 3);
    assert_eq!(game.current(), &worlds[13]);
    assert_eq!(game.target(), PlaybackTarget::End);
}

#[test]
fn frame_budget_comes_from_config() {
    let mut game = closed_match(
        20,
        ReplayConfig::new().with_frame_budget(Duration::from_secs(5)),
    );
    game.play();
    let report = game.compute_frame();
    assert_eq!(report.status, ComputeStatus::ReachedTarget);
    assert_eq!(report.turn, 20);
}

#[test]
fn zero_budget_is_a_no_op() {
    let mut game = closed_match(20, ReplayConfig::default());
    game.play();
    let report = game.compute(Duration::ZERO);
    assert_eq!(report.applied, 0);
    assert_eq!(game.current_turn(), 0);
}
