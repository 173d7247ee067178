/// Manual completion toggle, mounted in toggle completion mode

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::{parse_habit_id, ApiError, AppState};
use crate::domain::Habit;
use crate::storage::HabitStorage;

/// `PATCH /habits/:id/complete`
pub async fn toggle_completion<S: HabitStorage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(habit_id): Path<String>,
) -> Result<Json<Habit>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let habit = state.service.toggle_completion(&habit_id)?;
    Ok(Json(habit))
}
