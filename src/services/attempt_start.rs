use thiserror::Error;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Quiz, QuizAttempt, User};
use crate::repositories;
use crate::services::availability::{check_availability, AvailabilityReason};

#[derive(Debug, Error)]
pub(crate) enum StartAttemptError {
    #[error("Quiz not found")]
    QuizNotFound,
    #[error("{}", .0.message())]
    Unavailable(AvailabilityReason),
    #[error("You are not enrolled in the course for this quiz")]
    NotEnrolled,
    #[error("You have already completed this quiz")]
    AlreadyCompleted,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub(crate) struct StartedAttempt {
    pub(crate) attempt: QuizAttempt,
    pub(crate) quiz: Quiz,
    pub(crate) resumed: bool,
    pub(crate) time_remaining_seconds: i64,
}

pub(crate) fn time_remaining_seconds(
    duration_minutes: i32,
    started_at: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> i64 {
    let elapsed = (now - started_at).whole_seconds().max(0);
    (i64::from(duration_minutes) * 60 - elapsed).max(0)
}

/// Opens the single attempt a student gets for `quiz_id`, or hands back the
/// one already in progress.
pub(crate) async fn start_attempt(
    state: &AppState,
    user: &User,
    quiz_id: i64,
) -> Result<StartedAttempt, StartAttemptError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await?
        .ok_or(StartAttemptError::QuizNotFound)?;
    let question_count = repositories::questions::count_by_quiz(state.db(), quiz.id).await?;

    let availability = check_availability(
        &quiz,
        question_count,
        OffsetDateTime::now_utc(),
        state.settings().quiz().timezone_offset,
    );
    if !availability.available {
        return Err(StartAttemptError::Unavailable(availability.reason));
    }

    if let Some(course_id) = quiz.course_id.as_deref().filter(|id| !id.trim().is_empty()) {
        ensure_enrolled(state, user, course_id).await?;
    }

    let now = primitive_now_utc();
    let created = repositories::attempts::create_if_absent(state.db(), &user.id, quiz.id, now).await?;
    let attempt = repositories::attempts::find_by_user_and_quiz(state.db(), &user.id, quiz.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    if attempt.status.is_completed() {
        return Err(StartAttemptError::AlreadyCompleted);
    }

    if created {
        tracing::info!(attempt_id = attempt.id, quiz_id = quiz.id, user_id = %user.id, "Quiz attempt started");
    }

    let time_remaining_seconds = time_remaining_seconds(quiz.duration_minutes, attempt.started_at, now);
    Ok(StartedAttempt { attempt, quiz, resumed: !created, time_remaining_seconds })
}

/// Any analyzer failure counts as not enrolled.
async fn ensure_enrolled(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<(), StartAttemptError> {
    match state.analyzer().enrolled_course_ids(&user.username).await {
        Ok(courses) if courses.iter().any(|course| course == course_id) => Ok(()),
        Ok(_) => Err(StartAttemptError::NotEnrolled),
        Err(err) => {
            tracing::warn!(
                user_id = %user.id,
                course_id,
                error = %err,
                "Enrollment lookup failed"
            );
            Err(StartAttemptError::NotEnrolled)
        }
    }
}
