/// Habit entity and related functionality
///
/// This module defines the core Habit struct that represents a user's habit
/// they want to track, along with validation and partial updates.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{HabitId, Upload, DomainError};

/// A habit represents something the user wants to do every day
///
/// This is the core entity in our system. Besides its name and description a
/// habit carries the current streak, today's completion flag and the ordered
/// list of proof-of-completion uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Display name (e.g., "Morning Run", "Read for 30min")
    pub name: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Consecutive-day completion counter
    pub streak: u32,
    /// Whether the habit is done for the current day
    pub is_completed: bool,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// Daily uploads, in insertion order
    pub uploads: Vec<Upload>,
}

/// Partial update of a habit's editable fields
///
/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub streak: Option<u32>,
    pub is_completed: Option<bool>,
}

impl HabitPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.streak.is_none()
            && self.is_completed.is_none()
    }
}

impl Habit {
    /// Create a new habit with validation
    ///
    /// `require_description` decides whether a missing description is an
    /// error; deployments differ on this.
    pub fn new(
        name: String,
        description: Option<String>,
        require_description: bool,
    ) -> Result<Self, DomainError> {
        Self::validate_name(&name)?;
        Self::validate_description(&description, require_description)?;

        Ok(Self {
            id: HabitId::new(),
            name: name.trim().to_string(),
            description,
            streak: 0,
            is_completed: false,
            created_at: Utc::now(),
            uploads: Vec::new(),
        })
    }

    /// Create a habit from existing data (used when loading from database)
    ///
    /// This constructor assumes data is already validated.
    pub fn from_existing(
        id: HabitId,
        name: String,
        description: Option<String>,
        streak: u32,
        is_completed: bool,
        created_at: DateTime<Utc>,
        uploads: Vec<Upload>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            streak,
            is_completed,
            created_at,
            uploads,
        }
    }

    /// Apply a partial update with validation
    ///
    /// Nothing is modified unless every present field is valid. A present
    /// description is held to the same `require_description` rule as `new`.
    pub fn update(&mut self, patch: HabitPatch, require_description: bool) -> Result<(), DomainError> {
        if let Some(ref new_name) = patch.name {
            Self::validate_name(new_name)?;
        }

        if patch.description.is_some() {
            Self::validate_description(&patch.description, require_description)?;
        }

        if let Some(new_name) = patch.name {
            self.name = new_name.trim().to_string();
        }
        if let Some(new_description) = patch.description {
            self.description = Some(new_description);
        }
        if let Some(new_streak) = patch.streak {
            self.streak = new_streak;
        }
        if let Some(new_is_completed) = patch.is_completed {
            self.is_completed = new_is_completed;
        }

        Ok(())
    }

    /// The most recent upload, if any
    pub fn last_upload(&self) -> Option<&Upload> {
        self.uploads.last()
    }

    // Validation helper methods

    /// Validate habit name according to business rules
    fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string()
            ));
        }

        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string()
            ));
        }

        Ok(())
    }

    /// Validate optional description
    fn validate_description(
        description: &Option<String>,
        required: bool,
    ) -> Result<(), DomainError> {
        match description {
            Some(desc) if desc.chars().count() > 500 => Err(DomainError::Validation {
                message: "Description cannot be longer than 500 characters".to_string()
            }),
            Some(desc) if required && desc.trim().is_empty() => Err(DomainError::Validation {
                message: "Description is required".to_string()
            }),
            None if required => Err(DomainError::Validation {
                message: "Description is required".to_string()
            }),
            _ => Ok(()),
        }
    }
}
