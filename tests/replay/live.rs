//! Live match integration tests
//!
//! Tests a match fed incrementally through the wire stream decoder.

use std::time::Duration;

use playback_foundation::{EntityId, ErrorCategory, TeamId};
use playback_replay::{ComputeStatus, ManualClock, Match, ReplayConfig};
use playback_storage::{DeltaRecord, Metadata};
use playback_wire::{Frame, MatchFooter, MatchHeader, StreamDecoder, encode_frame, preamble};

use crate::{initial, metadata, records, reference_worlds};

fn header() -> MatchHeader {
    MatchHeader {
        metadata: Metadata::clone(&metadata()),
        initial: initial(),
    }
}

#[test]
fn streamed_match_follows_producer() {
    let worlds = reference_worlds(30);
    let mut decoder = StreamDecoder::new().with_source("socket");
    decoder.feed(&preamble());
    decoder.feed(&encode_frame(&Frame::Header(header())).unwrap());

    let mut game = Match::from_stream(&mut decoder, ReplayConfig::default())
        .unwrap()
        .unwrap();
    game.play();

    let mut clock = ManualClock::new();
    for chunk in records(30).chunks(7) {
        for record in chunk {
            decoder.feed(&encode_frame(&Frame::Delta(record.clone())).unwrap());
        }
        assert_eq!(game.ingest(&mut decoder).unwrap(), chunk.len());

        let report = game.compute_with(Duration::from_millis(5), &mut clock);
        assert_eq!(report.status, ComputeStatus::AwaitingRecords);
        assert_eq!(game.current(), &worlds[game.current_turn() as usize]);
    }
    assert_eq!(game.current_turn(), 30);

    let footer = MatchFooter::new(Some(TeamId::new(1)), 30);
    decoder.feed(&encode_frame(&Frame::Footer(footer)).unwrap());
    game.ingest(&mut decoder).unwrap();
    assert!(game.is_finished());
    assert_eq!(game.winner(), Some(TeamId::new(1)));
}

#[test]
fn seek_ahead_of_stream_waits() {
    let mut game = Match::from_header(header(), ReplayConfig::default()).unwrap();
    let all = records(20);
    for record in &all[..5] {
        game.push_delta(record.clone()).unwrap();
    }

    assert_eq!(game.seek(12).unwrap(), 5);
    assert!(game.is_pending());

    for record in &all[5..] {
        game.push_delta(record.clone()).unwrap();
    }
    let report = game.compute(Duration::from_secs(1));
    assert_eq!(report.status, ComputeStatus::ReachedTarget);
    assert_eq!(game.current_turn(), 12);
}

#[test]
fn broken_record_is_rejected_at_ingest() {
    let mut game = Match::from_header(header(), ReplayConfig::default()).unwrap();
    let mut decoder = StreamDecoder::new();
    decoder.feed(&preamble());
    decoder.feed(&encode_frame(&Frame::Header(header())).unwrap());
    decoder.next_frame().unwrap();

    let broken = DeltaRecord::new(1).remove(EntityId::new(77));
    decoder.feed(&encode_frame(&Frame::Delta(broken)).unwrap());
    let err = game.ingest(&mut decoder).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Referential);
    assert_eq!(game.last_turn(), 0);
}

#[test]
fn second_header_is_rejected() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(&preamble());
    decoder.feed(&encode_frame(&Frame::Header(header())).unwrap());
    let mut game = Match::from_stream(&mut decoder, ReplayConfig::default())
        .unwrap()
        .unwrap();

    let mut other = StreamDecoder::new();
    other.feed(&preamble());
    other.feed(&encode_frame(&Frame::Header(header())).unwrap());
    assert!(game.ingest(&mut other).is_err());
}
