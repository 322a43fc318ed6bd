//! Integration tests for id types
//!
//! Tests construction, display, and the dense index bound.

use playback_foundation::{BodyTypeId, EntityId, TeamId};

// =============================================================================
// Entity Ids
// =============================================================================

#[test]
fn entity_id_display_and_debug() {
    let id = EntityId::new(12_345);
    assert_eq!(format!("{id}"), "#12345");
    assert_eq!(format!("{id:?}"), "EntityId(12345)");
    assert_eq!(id.get(), 12_345);
}

#[test]
fn entity_id_index_bound() {
    assert!(EntityId::new(0).is_indexable());
    assert!(EntityId::new(EntityId::MAX_INDEXED).is_indexable());
    assert!(!EntityId::new(EntityId::MAX_INDEXED + 1).is_indexable());
}

#[test]
fn entity_id_from_u32() {
    let id: EntityId = 9.into();
    assert_eq!(id, EntityId::new(9));
}

#[test]
fn entity_ids_order_by_value() {
    let mut ids = vec![EntityId::new(3), EntityId::new(1), EntityId::new(2)];
    ids.sort();
    assert_eq!(ids, vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]);
}

// =============================================================================
// Team and Body Type Ids
// =============================================================================

#[test]
fn team_and_type_display() {
    assert_eq!(format!("{}", TeamId::new(2)), "team 2");
    assert_eq!(format!("{}", BodyTypeId::new(4)), "type 4");
    assert_eq!(TeamId::new(2).get(), 2);
    assert_eq!(BodyTypeId::new(4).get(), 4);
}
