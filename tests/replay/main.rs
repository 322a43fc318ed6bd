//! Integration tests for Layer 3: Replay
//!
//! Tests seeking, bounded compute, live ingest, games, and log queries
//! against matches built through the storage and wire layers.

mod compute;
mod game;
mod live;
mod seeking;

use std::sync::Arc;

use playback_foundation::{BodyTypeId, EntityId, TeamId, Turn};
use playback_replay::{Match, ReplayConfig};
use playback_storage::{
    BodyField, BodyRow, BodyTypeSpec, DeltaRecord, GameWorld, InitialState, MapInfo, Metadata,
    TeamInfo, TeamStat,
};

pub const RED: TeamId = TeamId::new(1);
pub const BLUE: TeamId = TeamId::new(2);
pub const CENTER: BodyTypeId = BodyTypeId::new(0);
pub const POLITICIAN: BodyTypeId = BodyTypeId::new(1);

pub fn metadata() -> Arc<Metadata> {
    Arc::new(
        Metadata::new()
            .with_team(TeamInfo::new(RED, "red"))
            .with_team(TeamInfo::new(BLUE, "blue"))
            .with_body_type(BodyTypeSpec::new(CENTER, "ENLIGHTENMENT_CENTER"))
            .with_body_type(BodyTypeSpec::new(POLITICIAN, "POLITICIAN")),
    )
}

pub fn initial() -> InitialState {
    InitialState {
        map: MapInfo::new("duel", (0, 0), 32, 32),
        bodies: vec![
            BodyRow::new(EntityId::new(1), RED, CENTER, 2, 2),
            BodyRow::new(EntityId::new(2), BLUE, CENTER, 29, 29),
        ],
    }
}

/// A longer match: each center spawns a politician every 5 turns, which
/// walks toward the other side and is removed 12 turns later.
pub fn records(turns: Turn) -> Vec<DeltaRecord> {
    (1..=turns)
        .map(|turn| {
            let mut record = DeltaRecord::new(turn)
                .set_stat(RED, TeamStat::Income, turn as i32)
                .set_stat(BLUE, TeamStat::Income, 2 * turn as i32);
            if turn % 5 == 0 {
                record = record
                    .spawn(BodyRow::new(EntityId::new(1000 + turn), RED, POLITICIAN, 3, 3))
                    .spawn(BodyRow::new(EntityId::new(2000 + turn), BLUE, POLITICIAN, 28, 28))
                    .with_logs(format!(
                        "[A:ENLIGHTENMENT_CENTER#1@{turn}] spawned {}\n[B:ENLIGHTENMENT_CENTER#2@{turn}] spawned {}",
                        1000 + turn,
                        2000 + turn
                    ));
            }
            for born in (5..turn).step_by(5).filter(|b| turn - b < 12) {
                let step = (turn - born) as i32;
                record = record
                    .move_to(EntityId::new(1000 + born), 3 + step, 3 + step)
                    .set_field(EntityId::new(2000 + born), BodyField::X, 28 - step);
            }
            if turn > 12 && (turn - 12) % 5 == 0 {
                let born = turn - 12;
                record = record
                    .remove(EntityId::new(1000 + born))
                    .remove(EntityId::new(2000 + born));
            }
            record
        })
        .collect()
}

pub fn closed_match(turns: Turn, config: ReplayConfig) -> Match {
    let mut game = Match::new(metadata(), initial(), config).unwrap();
    for record in records(turns) {
        game.push_delta(record).unwrap();
    }
    game.close(None);
    game
}

/// World at every turn, built by applying records one at a time.
pub fn reference_worlds(turns: Turn) -> Vec<GameWorld> {
    let mut world = GameWorld::from_initial(metadata(), initial()).unwrap();
    let mut worlds = vec![world.clone()];
    for record in records(turns) {
        world.apply_delta(&record).unwrap();
        worlds.push(world.clone());
    }
    worlds
}
