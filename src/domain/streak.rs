/// Streak state machine
///
/// These methods keep a habit's `streak` and `is_completed` consistent with
/// its upload history. They operate on an in-memory habit only; loading and
/// storing the record around them is the storage layer's job.

use chrono::{DateTime, Duration, Utc};
use crate::domain::{calendar_day, DomainError, Habit, Upload};

impl Habit {
    /// Record today's proof-of-completion upload
    ///
    /// Rejects a second upload on the same calendar day without touching the
    /// habit. Otherwise the upload is appended and the streak continues if
    /// the previous upload was yesterday, or restarts at 1.
    pub fn record_upload(
        &mut self,
        image_url: String,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let today = calendar_day(&now);
        let last_upload_day = self.last_upload().map(Upload::calendar_day);

        if self.has_upload_on(now) {
            return Err(DomainError::DuplicateUpload { date: today });
        }

        let upload = Upload::new(now, image_url)?;
        self.uploads.push(upload);

        let yesterday = today - Duration::days(1);
        self.streak = if last_upload_day == Some(yesterday) {
            self.streak.saturating_add(1)
        } else {
            1
        };
        self.is_completed = true;

        Ok(())
    }

    /// Whether the last upload falls on the same calendar day as `now`
    pub fn has_upload_on(&self, now: DateTime<Utc>) -> bool {
        self.last_upload()
            .map(|upload| upload.calendar_day() == calendar_day(&now))
            .unwrap_or(false)
    }

    /// Remove today's upload and undo one day of streak
    ///
    /// Returns the removed upload so the caller can clean up the stored image.
    pub fn delete_today_upload(&mut self, now: DateTime<Utc>) -> Result<Upload, DomainError> {
        let today = calendar_day(&now);

        let position = self
            .uploads
            .iter()
            .rposition(|upload| upload.calendar_day() == today)
            .ok_or(DomainError::NoUploadToday { date: today })?;

        let removed = self.uploads.remove(position);
        self.streak = self.streak.saturating_sub(1);
        self.is_completed = false;

        Ok(removed)
    }

    /// Flip the manual completion flag
    ///
    /// Completing bumps the streak; un-completing leaves it as is.
    pub fn toggle_completion(&mut self) {
        self.is_completed = !self.is_completed;
        if self.is_completed {
            self.streak = self.streak.saturating_add(1);
        }
    }
}
