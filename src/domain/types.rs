/// Core types used throughout the domain layer
///
/// This module defines the identifier type and the completion mode that
/// Habit, Upload and the streak state machine share.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a habit
///
/// This is a wrapper around UUID to provide type safety. On the wire it is
/// the plain hyphenated UUID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub Uuid);

impl HabitId {
    /// Generate a new random habit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a habit ID from a string (path parameters, database rows)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a habit gets marked as done for the day
///
/// `Upload` requires a daily photo as proof and drives the streak from the
/// upload history. `Toggle` lets the client flip the completion flag by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// Daily photo upload marks the habit complete
    #[default]
    Upload,
    /// Manual complete/uncomplete toggle
    Toggle,
}

impl CompletionMode {
    /// Get the display name for this mode
    pub fn display_name(&self) -> &'static str {
        match self {
            CompletionMode::Upload => "upload",
            CompletionMode::Toggle => "toggle",
        }
    }
}
