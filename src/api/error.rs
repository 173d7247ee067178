/// Mapping of service errors onto HTTP responses
///
/// Every failure leaves as a JSON body with a human readable `message` and,
/// for server-side failures, an `error` detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{DomainError, HabitId};
use crate::service::ServiceError;
use crate::storage::ImageStoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Habit not found")]
    InvalidId,

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidId => StatusCode::NOT_FOUND,
            ApiError::Service(error) => match error {
                ServiceError::Domain(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ServiceError::Images(ImageStoreError::Empty)
                | ServiceError::Images(ImageStoreError::TooLarge { .. }) => StatusCode::BAD_REQUEST,
                ServiceError::Images(ImageStoreError::Io { .. })
                | ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Service(ServiceError::Domain(DomainError::Validation { message })) => ErrorBody {
                message: message.clone(),
                error: None,
            },
            ApiError::Service(ServiceError::NotFound { .. }) | ApiError::InvalidId => ErrorBody {
                message: "Habit not found".to_string(),
                error: None,
            },
            ApiError::Service(ServiceError::Persistence(e)) => ErrorBody {
                message: "Database operation failed".to_string(),
                error: Some(e.to_string()),
            },
            ApiError::Service(ServiceError::Images(e @ ImageStoreError::Io { .. })) => ErrorBody {
                message: "Failed to store image".to_string(),
                error: Some(e.to_string()),
            },
            other => ErrorBody {
                message: other.to_string(),
                error: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        (status, Json(self.body())).into_response()
    }
}

/// Parse a path id; anything that is not a UUID cannot name a habit
pub fn parse_habit_id(raw: &str) -> Result<HabitId, ApiError> {
    HabitId::from_string(raw).map_err(|_| ApiError::InvalidId)
}
