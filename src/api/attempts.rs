use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::attempt::{
    AttemptAnswerResponse, AttemptResultResponse, SubmitAttemptRequest, SubmitAttemptResponse,
};
use crate::schemas::sync::SyncAttemptResponse;
use crate::services::attempt_submit;
use crate::services::mark_sync::{self, SyncError, SyncOutcome};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:attempt_id", get(get_attempt))
        .route("/:attempt_id/submit", post(submit_attempt))
        .route("/:attempt_id/sync", post(sync_attempt))
}

async fn submit_attempt(
    Path(attempt_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<Json<SubmitAttemptResponse>, ApiError> {
    let outcome =
        attempt_submit::submit_attempt(&state, &user, attempt_id, &payload.answers).await?;
    Ok(Json(outcome.into()))
}

async fn get_attempt(
    Path(attempt_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptResultResponse>, ApiError> {
    let attempt = repositories::attempts::find_by_id(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    let is_staff = user.role == UserRole::Staff;
    if attempt.user_id != user.id && !is_staff {
        return Err(ApiError::Forbidden("Access denied"));
    }

    let quiz = repositories::quizzes::find_by_id(state.db(), attempt.quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let show_answers =
        attempt.status.is_completed() && (is_staff || quiz.show_results || quiz.allow_review);
    let answers = if show_answers {
        let answers = repositories::answers::list_by_attempt(state.db(), attempt.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;
        let selections = repositories::answers::list_selected_choices(state.db(), attempt.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch selected choices"))?;

        let mut selected: HashMap<i64, Vec<i64>> = HashMap::new();
        for (answer_id, choice_id) in selections {
            selected.entry(answer_id).or_default().push(choice_id);
        }

        Some(
            answers
                .into_iter()
                .map(|answer| {
                    let choices = selected.remove(&answer.id).unwrap_or_default();
                    AttemptAnswerResponse::new(answer, choices)
                })
                .collect(),
        )
    } else {
        None
    };

    Ok(Json(AttemptResultResponse::new(attempt, quiz.passing_score, answers)))
}

async fn sync_attempt(
    Path(attempt_id): Path<i64>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<SyncAttemptResponse>, ApiError> {
    let result = mark_sync::sync_attempt(&state, attempt_id, staff.email.as_deref()).await;

    let response = match result {
        Ok(SyncOutcome::Synced { scaled_score, teacher_email }) => SyncAttemptResponse {
            attempt_id,
            success: true,
            already_synced: false,
            marks_synced: true,
            scaled_score: Some(scaled_score),
            teacher_email: Some(teacher_email),
            error: None,
        },
        Ok(SyncOutcome::AlreadySynced) => SyncAttemptResponse {
            attempt_id,
            success: true,
            already_synced: true,
            marks_synced: true,
            scaled_score: None,
            teacher_email: None,
            error: None,
        },
        // Analyzer failures are an expected outcome here, not a server error.
        Err(SyncError::Analyzer(err)) => SyncAttemptResponse {
            attempt_id,
            success: false,
            already_synced: false,
            marks_synced: false,
            scaled_score: None,
            teacher_email: None,
            error: Some(err.to_string()),
        },
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        attempt_id,
        staff_id = %staff.id,
        success = response.success,
        "Manual marks sync requested"
    );

    Ok(Json(response))
}
