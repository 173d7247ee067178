/// CRUD handlers for the habit collection

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::{parse_habit_id, ApiError, AppState};
use crate::domain::{Habit, HabitPatch};
use crate::storage::HabitStorage;

/// Body of `POST /habits`
#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Body of `PATCH`/`PUT /habits/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub streak: Option<u32>,
    #[serde(alias = "is_completed")]
    pub is_completed: Option<bool>,
}

impl From<UpdateHabitRequest> for HabitPatch {
    fn from(request: UpdateHabitRequest) -> Self {
        HabitPatch {
            name: request.name,
            description: request.description,
            streak: request.streak,
            is_completed: request.is_completed,
        }
    }
}

/// Response of `DELETE /habits/:id`
#[derive(Debug, Serialize)]
pub struct DeleteHabitResponse {
    pub message: String,
    pub habit: Habit,
}

pub async fn list_habits<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let habits = state.service.list_habits()?;
    Ok(Json(habits))
}

pub async fn get_habit<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(habit_id): Path<String>,
) -> Result<Json<Habit>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let habit = state.service.get_habit(&habit_id)?;
    Ok(Json(habit))
}

pub async fn create_habit<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateHabitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let habit = state.service.create_habit(request.name, request.description)?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn update_habit<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(habit_id): Path<String>,
    payload: Result<Json<UpdateHabitRequest>, JsonRejection>,
) -> Result<Json<Habit>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let habit = state.service.update_habit(&habit_id, request.into())?;
    Ok(Json(habit))
}

pub async fn delete_habit<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(habit_id): Path<String>,
) -> Result<Json<DeleteHabitResponse>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let habit = state.service.delete_habit(&habit_id).await?;

    Ok(Json(DeleteHabitResponse {
        message: "Habit deleted successfully".to_string(),
        habit,
    }))
}
