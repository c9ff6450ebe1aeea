use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::models::QuizAttempt;
use crate::db::types::{AttemptStatus, QuizType};

const COLUMNS: &str = "\
    id, user_id, quiz_id, status, score, total_points, total_questions, \
    started_at, completed_at, duration_seconds, feedback, graded_by, \
    marks_synced, last_sync_at, last_sync_attempt_at";

/// Quizzes whose results are reported to the analyzer.
const SYNC_ELIGIBLE_QUIZZES: &str = "\
    SELECT id FROM quizzes \
    WHERE quiz_type = $1 \
      AND course_id IS NOT NULL AND course_id <> '' \
      AND tutorial_number IS NOT NULL";

pub(crate) struct CompleteAttempt {
    pub(crate) id: i64,
    pub(crate) status: AttemptStatus,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) total_questions: i32,
    pub(crate) completed_at: PrimitiveDateTime,
    pub(crate) duration_seconds: i64,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CourseSyncCounts {
    pub(crate) course_id: String,
    pub(crate) total: i64,
    pub(crate) synced: i64,
    pub(crate) unsynced: i64,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_user_and_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: i64,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE user_id = $1 AND quiz_id = $2"
    ))
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(executor)
    .await
}

/// Row-locks the attempt for the rest of the surrounding transaction.
pub(crate) async fn lock_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Returns false when the (user, quiz) pair already has an attempt.
pub(crate) async fn create_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: i64,
    started_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (user_id, quiz_id, status, started_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id, quiz_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(AttemptStatus::InProgress)
    .bind(started_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Advances an in-progress attempt; false if it was already completed.
pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    params: CompleteAttempt,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_attempts
         SET status = $2,
             score = $3,
             total_points = $4,
             total_questions = $5,
             completed_at = $6,
             duration_seconds = $7
         WHERE id = $1 AND status = $8",
    )
    .bind(params.id)
    .bind(params.status)
    .bind(params.score)
    .bind(params.total_points)
    .bind(params.total_questions)
    .bind(params.completed_at)
    .bind(params.duration_seconds)
    .bind(AttemptStatus::InProgress)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Last write wins; concurrent syncs of the same attempt both succeed.
pub(crate) async fn mark_synced(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    synced_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quiz_attempts
         SET marks_synced = TRUE, last_sync_at = $2, last_sync_attempt_at = $2
         WHERE id = $1",
    )
    .bind(id)
    .bind(synced_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Stamps a failed push so the sweep moves on to attempts tried less recently.
pub(crate) async fn record_sync_failure(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    tried_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quiz_attempts SET last_sync_attempt_at = $2 WHERE id = $1 AND marks_synced = FALSE",
    )
    .bind(id)
    .bind(tried_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Completed, sync-eligible attempts not yet pushed.
///
/// Never-tried attempts come first, then the least recently tried, so a run of
/// permanently rejected attempts cannot starve the rest of the backlog.
pub(crate) async fn list_pending_sync(
    executor: impl sqlx::PgExecutor<'_>,
    limit: i64,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts
         WHERE completed_at IS NOT NULL
           AND marks_synced = FALSE
           AND quiz_id IN ({SYNC_ELIGIBLE_QUIZZES})
         ORDER BY last_sync_attempt_at NULLS FIRST, completed_at, id
         LIMIT $2"
    ))
    .bind(QuizType::Tutorial)
    .bind(limit.clamp(1, 500))
    .fetch_all(executor)
    .await
}

pub(crate) async fn sync_counts_by_course(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Vec<CourseSyncCounts>, sqlx::Error> {
    sqlx::query_as::<_, CourseSyncCounts>(&format!(
        "SELECT q.course_id AS course_id,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE a.marks_synced) AS synced,
                COUNT(*) FILTER (WHERE NOT a.marks_synced) AS unsynced
         FROM quiz_attempts a
         JOIN quizzes q ON q.id = a.quiz_id
         WHERE a.completed_at IS NOT NULL
           AND a.quiz_id IN ({SYNC_ELIGIBLE_QUIZZES})
         GROUP BY q.course_id
         ORDER BY q.course_id"
    ))
    .bind(QuizType::Tutorial)
    .fetch_all(executor)
    .await
}
