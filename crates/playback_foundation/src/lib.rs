//! Core ids, turn numbers, and error types for Playback.
//!
//! This crate provides:
//! - [`EntityId`], [`TeamId`], [`BodyTypeId`] - Typed identifiers
//! - [`Turn`] - Turn numbers
//! - [`Error`] - Rich error types with categories and context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;

pub use entity::{BodyTypeId, EntityId, TeamId, Turn};
pub use error::{Error, ErrorCategory, ErrorContext, ErrorKind, Result};
