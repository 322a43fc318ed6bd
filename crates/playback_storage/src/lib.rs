//! Columnar body storage, match metadata, delta records, and world snapshots
//! for Playback.
//!
//! This crate provides:
//! - [`Metadata`] - Teams and body type specifications
//! - [`BodyStore`] - Struct-of-arrays storage keyed by [`EntityId`](playback_foundation::EntityId)
//! - [`GameWorld`] - Simulation state at one turn, advanced by [`DeltaRecord`]s
//! - [`DeltaLog`] - Append-only log of delta records

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod body;
pub mod delta;
pub mod map;
pub mod metadata;
pub mod soa;
pub mod stats;
pub mod world;

pub use body::{BodyField, BodyRow};
pub use delta::{Change, DeltaLog, DeltaRecord};
pub use map::MapInfo;
pub use metadata::{BodyTypeSpec, Metadata, TeamInfo};
pub use soa::{BodyRef, BodyStore, RowIndex};
pub use stats::{TeamStat, TeamStats};
pub use world::{GameWorld, InitialState};
