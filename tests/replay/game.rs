//! Game integration tests
//!
//! Tests a best-of-three game streamed through the wire layer, with
//! profiler recordings attached to each match.

use playback_foundation::Turn;
use playback_replay::{ComputeStatus, Game, ReplayConfig};
use playback_storage::Metadata;
use playback_wire::{
    GameFooter, GameHeader, GameMatch, MatchFooter, ProfilerEvent, ProfilerFile, ProfilerProfile,
    StreamDecoder, encode_game,
};

use crate::{BLUE, RED, initial, metadata, records, reference_worlds};

const LENGTHS: [Turn; 3] = [20, 35, 15];

fn profile(team: &str, calls: u32) -> ProfilerFile {
    let mut profile = ProfilerProfile::new(format!("{team} ENLIGHTENMENT_CENTER"));
    for call in 0..calls {
        profile = profile
            .with_event(ProfilerEvent::open(0, call * 100))
            .with_event(ProfilerEvent::close(0, call * 100 + 60));
    }
    ProfilerFile::new().with_frame("run").with_profile(profile)
}

fn best_of_three() -> Vec<u8> {
    let winners = [RED, BLUE, BLUE];
    let matches: Vec<_> = LENGTHS
        .iter()
        .zip(winners)
        .map(|(&turns, winner)| GameMatch {
            initial: initial(),
            deltas: records(turns),
            footer: Some(
                MatchFooter::new(Some(winner), turns)
                    .with_profiler_file(profile("red", turns))
                    .with_profiler_file(profile("blue", 1)),
            ),
        })
        .collect();
    let header = GameHeader {
        metadata: Metadata::clone(&metadata()),
    };
    let footer = GameFooter {
        winner: None,
        total_matches: 3,
    };
    encode_game(&header, &matches, Some(&footer)).unwrap()
}

#[test]
fn streamed_game_replays_every_match() {
    let bytes = best_of_three();
    let mut decoder = StreamDecoder::new().with_source("game socket");
    let mut game = None;
    for chunk in bytes.chunks(64) {
        decoder.feed(chunk);
        match game.as_mut() {
            None => game = Game::from_stream(&mut decoder, ReplayConfig::default()).unwrap(),
            Some(game) => {
                game.ingest(&mut decoder).unwrap();
            }
        }
    }
    decoder.finish().unwrap();
    let mut game = game.unwrap();

    assert!(game.is_closed());
    assert_eq!(game.len(), 3);
    assert_eq!(game.wins(BLUE), 2);
    assert_eq!(game.winner(), Some(BLUE));

    for (index, &turns) in LENGTHS.iter().enumerate() {
        let worlds = reference_worlds(turns);
        let replay = game.get_mut(index).unwrap();
        assert_eq!(replay.last_turn(), turns);
        for turn in [turns, turns / 2, 0, turns - 1] {
            replay.seek(turn).unwrap();
            assert_eq!(replay.current(), &worlds[turn as usize]);
        }
    }
}

#[test]
fn profiler_files_are_exposed_per_match() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(&best_of_three());
    let game = Game::from_stream(&mut decoder, ReplayConfig::default())
        .unwrap()
        .unwrap();

    let second = game.get(1).unwrap();
    let files = second.profiler_files();
    assert_eq!(files.len(), 2);
    let red = &files[0].profiles[0];
    assert_eq!(red.events.len(), 70);
    assert_eq!(red.span(), 34 * 100 + 60);
    assert_eq!(files[0].frame_name(&red.events[0]), Some("run"));
    assert_eq!(files[1].profile("blue ENLIGHTENMENT_CENTER").unwrap().span(), 60);
}

#[test]
fn matches_play_independently() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(&best_of_three());
    let mut game = Game::from_stream(&mut decoder, ReplayConfig::default())
        .unwrap()
        .unwrap();

    let first = game.get_mut(0).unwrap();
    first.play();
    assert_eq!(
        first.compute(std::time::Duration::from_secs(1)).status,
        ComputeStatus::ReachedTarget
    );
    assert!(first.is_finished());

    assert_eq!(game.get(1).unwrap().current_turn(), 0);
    assert_eq!(game.get(2).unwrap().current_turn(), 0);
}
