//! Integration tests for Layer 1: Storage
//!
//! Tests for the columnar body store, world snapshots, and the delta log.

mod body_store;
mod delta_log;
