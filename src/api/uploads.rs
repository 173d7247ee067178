/// Daily photo upload handlers

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use chrono::Utc;

use crate::api::{parse_habit_id, ApiError, AppState};
use crate::domain::Habit;
use crate::storage::HabitStorage;

/// Form fields accepted as the uploaded image
const IMAGE_FIELDS: [&str; 2] = ["photo", "image"];

/// `POST /habits/:id/upload`: multipart form with a `photo` or `image` file
pub async fn upload_photo<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(habit_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Habit>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let is_image = field
            .name()
            .map(|name| IMAGE_FIELDS.contains(&name))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        image = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        image.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let habit = state
        .service
        .record_upload(&habit_id, file_name.as_deref(), &bytes, Utc::now())
        .await?;

    Ok(Json(habit))
}

/// `DELETE /habits/:id/upload`: undo today's upload
pub async fn delete_today_upload<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(habit_id): Path<String>,
) -> Result<Json<Habit>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let habit = state.service.delete_today_upload(&habit_id, Utc::now()).await?;
    Ok(Json(habit))
}
