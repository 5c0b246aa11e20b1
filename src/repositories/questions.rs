use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::Question;
use crate::services::questions::ValidatedQuestion;

const COLUMNS: &str = "id, test_id, position, question_text, options, correct_answer, explanation";

pub(crate) async fn list_by_test(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE test_id = $1 ORDER BY position"
    ))
    .bind(test_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_by_test(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn next_position(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(executor)
        .await
}

/// Inserts questions at consecutive positions starting from `first_position`.
pub(crate) async fn append(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
    first_position: i32,
    questions: Vec<ValidatedQuestion>,
) -> Result<u64, sqlx::Error> {
    if questions.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO questions (id, test_id, position, question_text, options, correct_answer, explanation) ",
    );
    builder.push_values(questions.into_iter().enumerate(), |mut row, (offset, question)| {
        row.push_bind(Uuid::new_v4().to_string())
            .push_bind(test_id.to_string())
            .push_bind(first_position + offset as i32)
            .push_bind(question.question_text)
            .push_bind(Json(question.options.into_vec()))
            .push_bind(question.correct_answer)
            .push_bind(question.explanation);
    });

    let result = builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}
