//! Stream decoder tests
//!
//! Tests decoding a container delivered in arbitrary chunks.

use playback_foundation::ErrorKind;
use playback_storage::DeltaRecord;
use playback_wire::{Frame, StreamDecoder, encode_frame, encode_match};

use crate::{deltas, header};

fn drain(decoder: &mut StreamDecoder) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Some(frame) = decoder.next_frame().unwrap() {
        frames.push(frame);
    }
    frames
}

#[test]
fn chunked_delivery_yields_whole_frames() {
    let bytes = encode_match(&header(), &deltas(), None).unwrap();
    for chunk in [1, 2, 7, 64, bytes.len()] {
        let mut decoder = StreamDecoder::new().with_source("live");
        let mut frames = Vec::new();
        for piece in bytes.chunks(chunk) {
            decoder.feed(piece);
            frames.extend(drain(&mut decoder));
        }
        assert_eq!(frames.len(), 4, "chunk size {chunk}");
        assert_eq!(frames[0], Frame::Header(header()));
        assert_eq!(decoder.buffered_len(), 0);
        decoder.finish().unwrap();
    }
}

#[test]
fn producer_can_append_after_decoder_catches_up() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(&encode_match(&header(), &deltas()[..1], None).unwrap());
    assert_eq!(drain(&mut decoder).len(), 2);
    assert!(decoder.next_frame().unwrap().is_none());

    decoder.feed(&encode_frame(&Frame::Delta(deltas()[1].clone())).unwrap());
    let frames = drain(&mut decoder);
    assert!(matches!(&frames[..], [Frame::Delta(d)] if d.turn == 2));
    assert_eq!(decoder.last_turn(), Some(2));
}

#[test]
fn replayed_frame_is_out_of_sequence() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(&encode_match(&header(), &deltas(), None).unwrap());
    drain(&mut decoder);

    decoder.feed(&encode_frame(&Frame::Delta(DeltaRecord::new(3))).unwrap());
    let err = decoder.next_frame().unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::OutOfSequence {
            expected: 4,
            actual: 3
        }
    ));
    let ctx = err.context.unwrap();
    assert_eq!(ctx.source.as_deref(), Some("stream"));
    assert_eq!(ctx.turn, Some(3));
}

#[test]
fn second_header_rejected() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(&encode_match(&header(), &[], None).unwrap());
    decoder.feed(&encode_frame(&Frame::Header(header())).unwrap());
    assert!(decoder.next_frame().unwrap().is_some());
    assert!(decoder.next_frame().is_err());
}
