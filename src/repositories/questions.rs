use crate::db::models::{Choice, Question};

const COLUMNS: &str =
    "id, quiz_id, text, question_type, points, order_index, correct_answer, created_at";

const CHOICE_COLUMNS: &str = "id, question_id, text, is_correct, order_index";

pub(crate) async fn list_by_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE quiz_id = $1 ORDER BY order_index, id"
    ))
    .bind(quiz_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_choices_by_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: i64,
) -> Result<Vec<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(&format!(
        "SELECT {CHOICE_COLUMNS} FROM choices \
         WHERE question_id IN (SELECT id FROM questions WHERE quiz_id = $1) \
         ORDER BY question_id, order_index, id"
    ))
    .bind(quiz_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_by_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(executor)
        .await
}
