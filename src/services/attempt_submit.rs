use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::metrics::QUIZ_SUBMISSIONS_TOTAL;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::AttemptStatus;
use crate::repositories;
use crate::services::availability::{check_availability, AvailabilityReason};
use crate::services::grading::{self, parse_answer_key};
use crate::services::mark_sync::{self, SyncOutcome};

const SYNC_WARNING: &str =
    "Your score was saved but could not be sent to the analyzer yet; it will be retried.";

#[derive(Debug, Error)]
pub(crate) enum SubmitError {
    #[error("No active attempt found for this quiz")]
    NoActiveAttempt,
    #[error("This attempt has already been completed")]
    AlreadyCompleted,
    #[error("No valid answers were submitted")]
    NoValidAnswers,
    #[error("{}", .0.message())]
    Unavailable(AvailabilityReason),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl SubmitError {
    fn metric_label(&self) -> &'static str {
        match self {
            SubmitError::NoActiveAttempt => "no_active_attempt",
            SubmitError::AlreadyCompleted => "already_completed",
            SubmitError::NoValidAnswers => "no_valid_answers",
            SubmitError::Unavailable(_) => "unavailable",
            SubmitError::Database(_) => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SubmitOutcome {
    pub(crate) attempt_id: i64,
    pub(crate) status: AttemptStatus,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: f64,
    pub(crate) passed: bool,
    pub(crate) marks_synced: bool,
    pub(crate) sync_warning: Option<String>,
}

/// Keeps entries whose key names a question id; the rest are dropped.
pub(crate) fn parse_raw_answers(raw: &Map<String, Value>) -> HashMap<i64, Value> {
    let mut parsed = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        match parse_answer_key(key) {
            Some(question_id) => {
                parsed.insert(question_id, value.clone());
            }
            None => tracing::warn!(key = %key, "Dropping answer with unparseable question key"),
        }
    }
    parsed
}

/// Scores and completes `attempt_id` for `user`, then pushes the mark to the
/// analyzer when configured to. A failed push only sets `sync_warning`.
pub(crate) async fn submit_attempt(
    state: &AppState,
    user: &User,
    attempt_id: i64,
    raw_answers: &Map<String, Value>,
) -> Result<SubmitOutcome, SubmitError> {
    let result = score_and_complete(state, user, attempt_id, raw_answers).await;

    match &result {
        Ok((outcome, _)) => {
            metrics::counter!(QUIZ_SUBMISSIONS_TOTAL, "status" => outcome.status.as_str())
                .increment(1);
        }
        Err(err) => {
            metrics::counter!(QUIZ_SUBMISSIONS_TOTAL, "status" => err.metric_label()).increment(1);
            tracing::info!(attempt_id, user_id = %user.id, reason = %err, "Submission rejected");
        }
    }

    let (mut outcome, quiz_eligible) = result?;

    if state.settings().sync().sync_on_submit && quiz_eligible {
        match mark_sync::sync_attempt(state, attempt_id, None).await {
            Ok(SyncOutcome::Synced { .. }) | Ok(SyncOutcome::AlreadySynced) => {
                outcome.marks_synced = true;
            }
            Err(err) => {
                tracing::warn!(attempt_id, error = %err, "Marks sync after submit failed");
                outcome.sync_warning = Some(SYNC_WARNING.to_string());
            }
        }
    }

    Ok(outcome)
}

async fn score_and_complete(
    state: &AppState,
    user: &User,
    attempt_id: i64,
    raw_answers: &Map<String, Value>,
) -> Result<(SubmitOutcome, bool), SubmitError> {
    let mut tx = state.db().begin().await?;

    let attempt = repositories::attempts::lock_by_id(&mut *tx, attempt_id)
        .await?
        .filter(|attempt| attempt.user_id == user.id)
        .ok_or(SubmitError::NoActiveAttempt)?;
    if attempt.status.is_completed() {
        return Err(SubmitError::AlreadyCompleted);
    }

    let quiz = repositories::quizzes::find_by_id(&mut *tx, attempt.quiz_id)
        .await?
        .ok_or(SubmitError::NoActiveAttempt)?;
    let questions = repositories::questions::list_by_quiz(&mut *tx, quiz.id).await?;
    let choices = repositories::questions::list_choices_by_quiz(&mut *tx, quiz.id).await?;

    let availability = check_availability(
        &quiz,
        questions.len() as i64,
        OffsetDateTime::now_utc(),
        state.settings().quiz().timezone_offset,
    );
    if !availability.available {
        return Err(SubmitError::Unavailable(availability.reason));
    }

    let parsed = parse_raw_answers(raw_answers);
    if parsed.is_empty() {
        return Err(SubmitError::NoValidAnswers);
    }

    let gradable = grading::assemble(questions, choices);
    let grade = grading::grade_attempt(&gradable, &parsed, quiz.passing_score);
    let completed_at = primitive_now_utc();

    for answer in &grade.answers {
        let answer_id = repositories::answers::create(
            &mut *tx,
            repositories::answers::CreateAnswer {
                attempt_id: attempt.id,
                question_id: answer.question_id,
                text_answer: answer.text_answer(),
                boolean_answer: answer.boolean_answer(),
                is_correct: answer.verdict.is_correct,
                points_earned: answer.verdict.points_earned,
                needs_review: answer.verdict.needs_review,
                created_at: completed_at,
            },
        )
        .await?;
        repositories::answers::attach_choices(&mut *tx, answer_id, &answer.selected_choice_ids())
            .await?;
    }

    let status = grade.status();
    let completed = repositories::attempts::complete(
        &mut *tx,
        repositories::attempts::CompleteAttempt {
            id: attempt.id,
            status,
            score: grade.score,
            total_points: grade.total_points,
            total_questions: grade.total_questions,
            completed_at,
            duration_seconds: (completed_at - attempt.started_at).whole_seconds().max(0),
        },
    )
    .await?;
    if !completed {
        return Err(SubmitError::AlreadyCompleted);
    }

    tx.commit().await?;

    tracing::info!(
        attempt_id = attempt.id,
        quiz_id = quiz.id,
        user_id = %user.id,
        score = grade.score,
        total_points = grade.total_points,
        status = status.as_str(),
        "Quiz attempt submitted"
    );

    let outcome = SubmitOutcome {
        attempt_id: attempt.id,
        status,
        score: grade.score,
        total_points: grade.total_points,
        total_questions: grade.total_questions,
        percentage: grade.percentage,
        passed: grade.passed,
        marks_synced: false,
        sync_warning: None,
    };
    Ok((outcome, mark_sync::is_sync_eligible(&quiz)))
}
