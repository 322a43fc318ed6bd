//! Integration tests for Error types
//!
//! Tests error construction, display, categories, and context.

use playback_foundation::{
    BodyTypeId, EntityId, Error, ErrorCategory, ErrorContext, ErrorKind, TeamId,
};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_dangling_reference() {
    let err = Error::dangling_reference(9, EntityId::new(7));
    assert!(matches!(err.kind, ErrorKind::DanglingReference { turn: 9, .. }));
    let msg = format!("{err}");
    assert!(msg.contains("turn 9"));
    assert!(msg.contains("#7"));
}

#[test]
fn error_spawn_collision() {
    let err = Error::spawn_collision(3, EntityId::new(7));
    assert!(matches!(err.kind, ErrorKind::SpawnCollision { .. }));
    assert_eq!(err.category(), ErrorCategory::Referential);
}

#[test]
fn error_decode_and_encode() {
    let err = Error::decode("bad magic");
    assert!(format!("{err}").contains("bad magic"));
    assert_eq!(err.category(), ErrorCategory::Protocol);

    let err = Error::encode("too large");
    assert!(matches!(err.kind, ErrorKind::Encode(_)));
    assert_eq!(err.category(), ErrorCategory::Protocol);
}

#[test]
fn error_unsupported_version() {
    let err = Error::new(ErrorKind::UnsupportedVersion {
        found: 3,
        supported: 1,
    });
    let msg = format!("{err}");
    assert!(msg.contains('3'));
    assert!(msg.contains("supported: 1"));
}

// =============================================================================
// Categories
// =============================================================================

#[test]
fn every_kind_has_expected_category() {
    let id = EntityId::new(1);
    let cases = [
        (ErrorKind::UnknownId(id), ErrorCategory::Lookup),
        (ErrorKind::DuplicateId(id), ErrorCategory::Lookup),
        (ErrorKind::IdOutOfRange(id), ErrorCategory::Protocol),
        (
            ErrorKind::OutOfSequence {
                expected: 1,
                actual: 2,
            },
            ErrorCategory::Protocol,
        ),
        (ErrorKind::UnknownTeam(TeamId::new(5)), ErrorCategory::Referential),
        (
            ErrorKind::UnknownBodyType(BodyTypeId::new(5)),
            ErrorCategory::Referential,
        ),
        (
            ErrorKind::SeekOutOfRange {
                requested: 5,
                last: 4,
            },
            ErrorCategory::Range,
        ),
    ];
    for (kind, category) in cases {
        assert_eq!(kind.category(), category, "{kind}");
    }
}

#[test]
fn category_display() {
    assert_eq!(ErrorCategory::Protocol.to_string(), "protocol");
    assert_eq!(ErrorCategory::Referential.to_string(), "referential");
    assert_eq!(ErrorCategory::Range.to_string(), "range");
    assert_eq!(ErrorCategory::Lookup.to_string(), "lookup");
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_stack_frames() {
    let ctx = ErrorContext::new()
        .with_source("replay.pbrl")
        .with_frame("decode")
        .with_frame("delta ingest");
    let err = Error::decode("truncated").with_context(ctx);

    let ctx = err.context.as_ref().unwrap();
    assert_eq!(ctx.stack.len(), 2);
    let text = format!("{ctx}");
    assert!(text.starts_with("in replay.pbrl"));
    assert!(text.contains("  in delta ingest"));
}
