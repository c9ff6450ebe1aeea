use time::PrimitiveDateTime;

use crate::db::models::QuizAnswer;

const COLUMNS: &str = "\
    id, attempt_id, question_id, text_answer, boolean_answer, is_correct, \
    points_earned, needs_review, created_at";

pub(crate) struct CreateAnswer<'a> {
    pub(crate) attempt_id: i64,
    pub(crate) question_id: i64,
    pub(crate) text_answer: Option<&'a str>,
    pub(crate) boolean_answer: Option<bool>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) needs_review: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO quiz_answers (
            attempt_id, question_id, text_answer, boolean_answer,
            is_correct, points_earned, needs_review, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING id",
    )
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.text_answer)
    .bind(params.boolean_answer)
    .bind(params.is_correct)
    .bind(params.points_earned)
    .bind(params.needs_review)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn attach_choices(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: i64,
    choice_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if choice_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO quiz_answer_choices (answer_id, choice_id)
         SELECT $1, UNNEST($2::bigint[])
         ON CONFLICT DO NOTHING",
    )
    .bind(answer_id)
    .bind(choice_ids)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_attempt(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: i64,
) -> Result<Vec<QuizAnswer>, sqlx::Error> {
    sqlx::query_as::<_, QuizAnswer>(&format!(
        "SELECT {COLUMNS} FROM quiz_answers WHERE attempt_id = $1 ORDER BY id"
    ))
    .bind(attempt_id)
    .fetch_all(executor)
    .await
}

/// `(answer_id, choice_id)` pairs for every answer of the attempt.
pub(crate) async fn list_selected_choices(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: i64,
) -> Result<Vec<(i64, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT ac.answer_id, ac.choice_id
         FROM quiz_answer_choices ac
         JOIN quiz_answers a ON a.id = ac.answer_id
         WHERE a.attempt_id = $1
         ORDER BY ac.answer_id, ac.choice_id",
    )
    .bind(attempt_id)
    .fetch_all(executor)
    .await
}
