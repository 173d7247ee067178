/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, Upload) and the streak state
/// machine that keeps a habit's streak and completion flag consistent with
/// its upload history.

pub mod habit;
pub mod upload;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use upload::*;
pub use types::*;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("An upload for {date} already exists for this habit")]
    DuplicateUpload { date: NaiveDate },

    #[error("No upload found for today ({date})")]
    NoUploadToday { date: NaiveDate },
}
