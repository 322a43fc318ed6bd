//! Playback - Turn-based match replay engine
//!
//! This crate re-exports all layers of the Playback system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: playback_replay     — Match controller, snapshot cache, log filter
//! Layer 2: playback_wire       — Versioned MessagePack match container
//! Layer 1: playback_storage    — Metadata, columnar body store, world, deltas
//! Layer 0: playback_foundation — Core types (EntityId, TeamId, Turn, Error)
//! ```

pub use playback_foundation as foundation;
pub use playback_replay as replay;
pub use playback_storage as storage;
pub use playback_wire as wire;
