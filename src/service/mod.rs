/// Habit service: the operations the HTTP layer exposes
///
/// The service ties the habit storage and the image store together and runs
/// the streak state machine inside atomic storage updates. Handlers stay thin
/// and only translate requests and errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{DomainError, Habit, HabitId, HabitPatch};
use crate::storage::{HabitStorage, ImageStore, ImageStoreError, StorageError};

/// Errors surfaced by service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Habit not found: {habit_id}")]
    NotFound { habit_id: String },

    #[error("Database error: {0}")]
    Persistence(StorageError),

    #[error("Image storage error: {0}")]
    Images(#[from] ImageStoreError),
}

impl From<StorageError> for ServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::HabitNotFound { habit_id } => ServiceError::NotFound { habit_id },
            other => ServiceError::Persistence(other),
        }
    }
}

/// Habit operations over a storage backend and an image store
pub struct HabitService<S: HabitStorage> {
    storage: S,
    images: ImageStore,
    require_description: bool,
}

impl<S: HabitStorage> HabitService<S> {
    pub fn new(storage: S, images: ImageStore, require_description: bool) -> Self {
        Self {
            storage,
            images,
            require_description,
        }
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get a reference to the image store
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn list_habits(&self) -> Result<Vec<Habit>, ServiceError> {
        Ok(self.storage.list_habits()?)
    }

    pub fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, ServiceError> {
        Ok(self.storage.get_habit(habit_id)?)
    }

    /// Create a habit; a missing name is a validation error
    pub fn create_habit(
        &self,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Habit, ServiceError> {
        let name = name.ok_or_else(|| DomainError::Validation {
            message: "Habit name is required".to_string(),
        })?;

        let habit = Habit::new(name, description, self.require_description)?;
        self.storage.create_habit(&habit)?;

        tracing::info!("Created habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    /// Apply a partial update to a habit
    ///
    /// An empty patch is answered with the stored habit without a write.
    pub fn update_habit(&self, habit_id: &HabitId, patch: HabitPatch) -> Result<Habit, ServiceError> {
        if patch.is_empty() {
            return self.get_habit(habit_id);
        }

        let (habit, ()) = self.storage.modify_habit(habit_id, |habit| {
            habit
                .update(patch, self.require_description)
                .map_err(ServiceError::from)
        })?;

        Ok(habit)
    }

    /// Delete a habit and, best-effort, its stored images
    pub async fn delete_habit(&self, habit_id: &HabitId) -> Result<Habit, ServiceError> {
        let habit = self.storage.delete_habit(habit_id)?;
        self.images.remove_habit_images(habit_id).await;

        tracing::info!("Deleted habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    /// Store today's proof image and record it on the habit
    ///
    /// The file is written first and the record updated second. When the
    /// record update fails the file is removed again.
    pub async fn record_upload(
        &self,
        habit_id: &HabitId,
        original_name: Option<&str>,
        bytes: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Habit, ServiceError> {
        // Skip the disk write for requests that are bound to fail
        let current = self.storage.get_habit(habit_id)?;
        if current.has_upload_on(now) {
            return Err(DomainError::DuplicateUpload {
                date: now.date_naive(),
            }
            .into());
        }

        let stored = self.images.save(habit_id, original_name, bytes).await?;

        let result = self.storage.modify_habit(habit_id, |habit| {
            habit
                .record_upload(stored.url.clone(), now)
                .map_err(ServiceError::from)
        });

        match result {
            Ok((habit, ())) => {
                tracing::info!("Recorded upload for habit {}; streak is now {}", habit.id, habit.streak);
                Ok(habit)
            }
            Err(ServiceError::NotFound { habit_id: missing }) => {
                // Deleted while the file was being written
                tracing::debug!("Habit {} vanished during upload, removing its images", habit_id);
                self.images.remove_habit_images(habit_id).await;
                Err(ServiceError::NotFound { habit_id: missing })
            }
            Err(e) => {
                tracing::debug!("Upload for habit {} rejected, removing {}", habit_id, stored.url);
                self.images.remove(&stored.url).await;
                Err(e)
            }
        }
    }

    /// Remove today's upload, undoing one day of streak
    pub async fn delete_today_upload(
        &self,
        habit_id: &HabitId,
        now: DateTime<Utc>,
    ) -> Result<Habit, ServiceError> {
        let (habit, removed) = self.storage.modify_habit(habit_id, |habit| {
            habit.delete_today_upload(now).map_err(ServiceError::from)
        })?;

        self.images.remove(&removed.image_url).await;

        tracing::info!("Deleted today's upload for habit {}; streak is now {}", habit.id, habit.streak);
        Ok(habit)
    }

    /// Flip the manual completion flag
    pub fn toggle_completion(&self, habit_id: &HabitId) -> Result<Habit, ServiceError> {
        let (habit, ()) = self.storage.modify_habit(habit_id, |habit| {
            habit.toggle_completion();
            Ok::<(), ServiceError>(())
        })?;

        Ok(habit)
    }
}
