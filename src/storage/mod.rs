/// Storage layer for persisting habit data and uploaded images
///
/// Habit records live in SQLite; images live on disk under the configured
/// upload directory. Both are exposed through small interfaces so the service
/// layer does not care about the details.

pub mod sqlite;
pub mod migrations;
pub mod images;

// Re-export the main storage types
pub use sqlite::*;
pub use images::{ImageStore, ImageStoreConfig, ImageStoreError, StoredImage};

use thiserror::Error;
use crate::domain::{Habit, HabitId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Corrupt row in column {column}: {message}")]
    CorruptRow { column: &'static str, message: String },

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the storage interface for habits
///
/// Every call is atomic on its own. `modify_habit` extends that to a whole
/// load-mutate-store cycle so callers never race each other between reading
/// a habit and writing it back.
pub trait HabitStorage: Send + Sync {
    /// Create a new habit
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Get a habit by ID, uploads included
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// List every habit in creation order
    fn list_habits(&self) -> Result<Vec<Habit>, StorageError>;

    /// Load a habit, let `apply` mutate it and persist the result
    ///
    /// If `apply` fails nothing is written and its error is returned. On
    /// success the stored habit and `apply`'s output are returned.
    fn modify_habit<T, E, F>(&self, habit_id: &HabitId, apply: F) -> Result<(Habit, T), E>
    where
        F: FnOnce(&mut Habit) -> Result<T, E>,
        E: From<StorageError>;

    /// Delete a habit together with its uploads, returning what was removed
    fn delete_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;
}
