use thiserror::Error;

use crate::core::metrics::MARKS_SYNC_TOTAL;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Quiz;
use crate::db::types::QuizType;
use crate::repositories;
use crate::services::analyzer::{AnalyzerApi, AnalyzerError, MarksUpdate};

#[derive(Debug, Error)]
pub(crate) enum SyncError {
    #[error("attempt not found")]
    AttemptNotFound,
    #[error("attempt is not completed yet")]
    NotCompleted,
    #[error("quiz is not linked to a course tutorial")]
    NotEligible,
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SyncOutcome {
    Synced { scaled_score: f64, teacher_email: String },
    AlreadySynced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TeacherEmailSource {
    QuizCreator,
    CourseInstructor,
    StaffSession,
    Placeholder,
}

impl TeacherEmailSource {
    fn as_str(self) -> &'static str {
        match self {
            TeacherEmailSource::QuizCreator => "quiz_creator",
            TeacherEmailSource::CourseInstructor => "course_instructor",
            TeacherEmailSource::StaffSession => "staff_session",
            TeacherEmailSource::Placeholder => "placeholder",
        }
    }
}

/// Tutorial quizzes linked to a course slot are the only ones the analyzer tracks.
pub(crate) fn is_sync_eligible(quiz: &Quiz) -> bool {
    quiz.quiz_type == QuizType::Tutorial
        && quiz.course_id.as_deref().is_some_and(|course| !course.trim().is_empty())
        && quiz.tutorial_number.is_some()
}

/// Score on the analyzer's 0-10 tutorial scale, two decimals.
pub(crate) fn scaled_score(score: i32, total_points: i32) -> f64 {
    if total_points <= 0 {
        return 0.0;
    }
    let scaled = f64::from(score) / f64::from(total_points) * 10.0;
    (scaled * 100.0).round() / 100.0
}

pub(crate) fn placeholder_teacher_email(course_id: &str, domain: &str) -> String {
    format!("teacher_{}@{}", course_id.to_lowercase(), domain)
}

/// Walks the identity chain and stops at the first address found. The
/// analyzer is only consulted when the quiz creator has no email.
pub(crate) async fn resolve_teacher_email(
    analyzer: &dyn AnalyzerApi,
    creator_email: Option<&str>,
    course_id: &str,
    staff_email: Option<&str>,
    fallback_domain: &str,
) -> (String, TeacherEmailSource) {
    if let Some(email) = non_empty(creator_email) {
        return (email.to_string(), TeacherEmailSource::QuizCreator);
    }

    match analyzer.course_instructor_email(course_id).await {
        Ok(Some(email)) => return (email, TeacherEmailSource::CourseInstructor),
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(course_id, error = %err, "Course instructor lookup failed");
        }
    }

    if let Some(email) = non_empty(staff_email) {
        return (email.to_string(), TeacherEmailSource::StaffSession);
    }

    (placeholder_teacher_email(course_id, fallback_domain), TeacherEmailSource::Placeholder)
}

/// Pushes a completed attempt's mark to the analyzer.
///
/// Safe to call repeatedly: once `marks_synced` is set the call returns
/// [`SyncOutcome::AlreadySynced`] without contacting the analyzer. Failures
/// leave the flag untouched and stamp `last_sync_attempt_at`, so the sweep
/// retries them after attempts that have waited longer.
pub(crate) async fn sync_attempt(
    state: &AppState,
    attempt_id: i64,
    staff_email: Option<&str>,
) -> Result<SyncOutcome, SyncError> {
    let attempt = repositories::attempts::find_by_id(state.db(), attempt_id)
        .await?
        .ok_or(SyncError::AttemptNotFound)?;

    if attempt.marks_synced {
        metrics::counter!(MARKS_SYNC_TOTAL, "status" => "already_synced").increment(1);
        return Ok(SyncOutcome::AlreadySynced);
    }

    if attempt.completed_at.is_none() || !attempt.status.is_completed() {
        return Err(SyncError::NotCompleted);
    }

    let quiz = repositories::quizzes::find_by_id(state.db(), attempt.quiz_id)
        .await?
        .ok_or(SyncError::AttemptNotFound)?;
    if !is_sync_eligible(&quiz) {
        return Err(SyncError::NotEligible);
    }
    let (Some(course_id), Some(tutorial_number)) = (quiz.course_id.as_deref(), quiz.tutorial_number)
    else {
        return Err(SyncError::NotEligible);
    };

    let student = repositories::users::find_by_id(state.db(), &attempt.user_id)
        .await?
        .ok_or(SyncError::AttemptNotFound)?;

    let creator_email = match quiz.created_by.as_deref() {
        Some(creator_id) => repositories::users::find_email_by_id(state.db(), creator_id).await?,
        None => None,
    };

    let (teacher_email, source) = resolve_teacher_email(
        state.analyzer(),
        creator_email.as_deref(),
        course_id,
        staff_email,
        &state.settings().analyzer().fallback_email_domain,
    )
    .await;
    if source == TeacherEmailSource::Placeholder {
        tracing::warn!(attempt_id, course_id, teacher_email, "Using placeholder teacher email");
    }

    let scaled = scaled_score(attempt.score, attempt.total_points);
    let update = MarksUpdate::tutorial(
        &student.username,
        course_id,
        &teacher_email,
        tutorial_number,
        scaled,
    );

    if let Err(err) = state.analyzer().update_student_marks(&update).await {
        metrics::counter!(MARKS_SYNC_TOTAL, "status" => err.kind()).increment(1);
        tracing::warn!(
            attempt_id,
            course_id,
            tutorial_number,
            error = %err,
            "Failed to push marks to analyzer"
        );
        if let Err(db_err) =
            repositories::attempts::record_sync_failure(state.db(), attempt.id, primitive_now_utc())
                .await
        {
            tracing::error!(attempt_id, error = %db_err, "Failed to record marks sync failure");
        }
        return Err(err.into());
    }

    repositories::attempts::mark_synced(state.db(), attempt.id, primitive_now_utc()).await?;

    metrics::counter!(MARKS_SYNC_TOTAL, "status" => "success").increment(1);
    tracing::info!(
        attempt_id,
        course_id,
        tutorial_number,
        scaled_score = scaled,
        teacher_email_source = source.as_str(),
        "Marks synced to analyzer"
    );

    Ok(SyncOutcome::Synced { scaled_score: scaled, teacher_email })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
