//! Static map description.

// Map dimensions are small; offsets fit comfortably in usize and i32.
#![allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]

use playback_foundation::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The map a match is played on. Immutable once the match is loaded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapInfo {
    /// Map name.
    pub name: String,
    /// Minimum corner `(x, y)`.
    pub origin: (i32, i32),
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Seed the map was generated from.
    pub seed: u32,
    /// Row-major passability, one value per tile.
    passability: Vec<f64>,
}

impl MapInfo {
    /// Creates a fully passable map.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: (i32, i32), width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            origin,
            width,
            height,
            seed: 0,
            passability: vec![1.0; width as usize * height as usize],
        }
    }

    /// Builder method to set the generation seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set per-tile passability.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `tiles` does not hold exactly one value per
    /// tile.
    pub fn with_passability(mut self, tiles: Vec<f64>) -> Result<Self> {
        self.passability = tiles;
        self.check_tiles()?;
        Ok(self)
    }

    /// Checks that passability holds exactly one value per tile.
    ///
    /// # Errors
    ///
    /// Returns a decode error on a length mismatch.
    pub fn check_tiles(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize;
        if self.passability.len() != expected {
            return Err(Error::decode(format!(
                "map '{}' has {} passability values, expected {expected}",
                self.name,
                self.passability.len()
            )));
        }
        Ok(())
    }

    /// Maximum corner `(x, y)`, exclusive.
    #[must_use]
    pub const fn max_corner(&self) -> (i32, i32) {
        (
            self.origin.0 + self.width as i32,
            self.origin.1 + self.height as i32,
        )
    }

    /// Returns true if `(x, y)` lies on the map.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.offset(x, y).is_some()
    }

    /// Passability of the tile at `(x, y)`, or `None` off the map.
    #[must_use]
    pub fn passability(&self, x: i32, y: i32) -> Option<f64> {
        self.offset(x, y)
            .and_then(|i| self.passability.get(i).copied())
    }

    /// Row-major passability values.
    #[must_use]
    pub fn tiles(&self) -> &[f64] {
        &self.passability
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        let dx = x.checked_sub(self.origin.0)?;
        let dy = y.checked_sub(self.origin.1)?;
        if dx < 0 || dy < 0 || dx as u32 >= self.width || dy as u32 >= self.height {
            return None;
        }
        Some(dy as usize * self.width as usize + dx as usize)
    }
}
