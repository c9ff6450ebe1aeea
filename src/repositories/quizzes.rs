use crate::db::models::Quiz;

const COLUMNS: &str = "\
    id, title, description, quiz_type, course_id, tutorial_number, created_by, \
    start_date, start_date_offset, complete_by_date, complete_by_date_offset, \
    duration_minutes, passing_score, allow_retake, is_active, is_ended, \
    show_results, allow_review, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}
