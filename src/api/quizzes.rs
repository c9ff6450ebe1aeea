use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentStudent, CurrentUser};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::attempt::StartAttemptResponse;
use crate::schemas::quiz::AvailabilityResponse;
use crate::services::attempt_start;
use crate::services::availability::check_availability;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:quiz_id/availability", get(get_availability))
        .route("/:quiz_id/attempts", post(start_attempt))
}

async fn get_availability(
    Path(quiz_id): Path<i64>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;
    let question_count = repositories::questions::count_by_quiz(state.db(), quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    let now = OffsetDateTime::now_utc();
    let fallback = state.settings().quiz().timezone_offset;
    let availability = check_availability(&quiz, question_count, now, fallback);

    Ok(Json(AvailabilityResponse::build(&quiz, availability, question_count, now, fallback)))
}

async fn start_attempt(
    Path(quiz_id): Path<i64>,
    CurrentStudent(user): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<StartAttemptResponse>, ApiError> {
    let started = attempt_start::start_attempt(&state, &user, quiz_id).await?;
    Ok(Json(started.into()))
}
