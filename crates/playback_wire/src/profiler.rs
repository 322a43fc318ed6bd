//! Profiler recordings attached to a finished match.
//!
//! The layout follows speedscope's evented profiles. A file names every
//! method once in `frames`, and each profile is a run of open and close
//! events that point into `frames` and are stamped with the bytecode counter.

use playback_foundation::{Error, Result};
use serde::{Deserialize, Serialize};

/// Entry into or exit from one method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerEvent {
    /// True when the method was entered, false when it returned.
    pub is_open: bool,
    /// Bytecode counter when the event occurred.
    pub at: u32,
    /// Index into [`ProfilerFile::frames`].
    pub frame: u32,
}

impl ProfilerEvent {
    /// Creates an event entering `frame`.
    #[must_use]
    pub const fn open(frame: u32, at: u32) -> Self {
        Self {
            is_open: true,
            at,
            frame,
        }
    }

    /// Creates an event leaving `frame`.
    #[must_use]
    pub const fn close(frame: u32, at: u32) -> Self {
        Self {
            is_open: false,
            at,
            frame,
        }
    }
}

/// Events recorded for one body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerProfile {
    /// Display name, usually the body's type and id.
    pub name: String,
    /// Events in the order they occurred.
    pub events: Vec<ProfilerEvent>,
}

impl ProfilerProfile {
    /// Creates an empty profile.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
        }
    }

    /// Builder method to append an event.
    #[must_use]
    pub fn with_event(mut self, event: ProfilerEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Bytecodes between the first and the last event.
    #[must_use]
    pub fn span(&self) -> u32 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.at.saturating_sub(first.at),
            _ => 0,
        }
    }
}

/// All profiles recorded for one team in one match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerFile {
    /// Method names, referenced by index from events.
    pub frames: Vec<String>,
    /// One profile per profiled body.
    pub profiles: Vec<ProfilerProfile>,
}

impl ProfilerFile {
    /// Creates an empty file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a method name.
    #[must_use]
    pub fn with_frame(mut self, name: impl Into<String>) -> Self {
        self.frames.push(name.into());
        self
    }

    /// Builder method to add a profile.
    #[must_use]
    pub fn with_profile(mut self, profile: ProfilerProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Method name an event refers to.
    #[must_use]
    pub fn frame_name(&self, event: &ProfilerEvent) -> Option<&str> {
        self.frames.get(event.frame as usize).map(String::as_str)
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&ProfilerProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Checks that every event names a known frame, that counters never go
    /// backwards, and that each close matches the innermost open method.
    ///
    /// Methods still open at the end of a profile are allowed; a body can
    /// be cut off mid-call.
    ///
    /// # Errors
    ///
    /// Returns a decode error describing the first bad event.
    pub fn check(&self) -> Result<()> {
        for profile in &self.profiles {
            let mut open = Vec::new();
            let mut last_at = 0;
            for (i, event) in profile.events.iter().enumerate() {
                if event.frame as usize >= self.frames.len() {
                    return Err(Error::decode(format!(
                        "profile '{}' event {i} names frame {} of {}",
                        profile.name,
                        event.frame,
                        self.frames.len()
                    )));
                }
                if event.at < last_at {
                    return Err(Error::decode(format!(
                        "profile '{}' event {i} goes back from {last_at} to {}",
                        profile.name, event.at
                    )));
                }
                last_at = event.at;

                if event.is_open {
                    open.push(event.frame);
                } else if open.pop() != Some(event.frame) {
                    return Err(Error::decode(format!(
                        "profile '{}' event {i} closes frame {} which is not innermost",
                        profile.name, event.frame
                    )));
                }
            }
        }
        Ok(())
    }
}
