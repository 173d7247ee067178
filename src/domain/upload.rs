/// Upload entity for daily proof-of-completion photos
///
/// An Upload ties a stored image to the moment it was received. All of the
/// streak logic only looks at the calendar day of that moment.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::DomainError;

/// One photo recorded as proof that a habit was done on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    /// When the upload was recorded
    pub date: DateTime<Utc>,
    /// Public path of the stored image (e.g. `/uploads/<habitId>/<file>`)
    pub image_url: String,
}

impl Upload {
    /// Create a new upload with validation
    pub fn new(date: DateTime<Utc>, image_url: String) -> Result<Self, DomainError> {
        if image_url.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "Upload image URL cannot be empty".to_string(),
            });
        }

        Ok(Self { date, image_url })
    }

    /// The calendar day (UTC) this upload counts for
    pub fn calendar_day(&self) -> NaiveDate {
        calendar_day(&self.date)
    }
}

/// Date component of a timestamp, ignoring time-of-day
pub fn calendar_day(timestamp: &DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}
