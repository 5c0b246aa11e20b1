use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{ResultSummary, TestResult};

const COLUMNS: &str = "\
    id, student_id, test_id, answers, score, total_questions, percentage, \
    time_taken_minutes, elapsed_seconds, is_late, completed_at";

pub(crate) struct CreateResult<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) answers: Vec<i32>,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) time_taken_minutes: Option<i32>,
    pub(crate) elapsed_seconds: i64,
    pub(crate) is_late: bool,
    pub(crate) completed_at: time::PrimitiveDateTime,
}

/// Writes the result once per (student, test); `None` when one is already stored.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<Option<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "INSERT INTO test_results (
            id, student_id, test_id, answers, score, total_questions, percentage,
            time_taken_minutes, elapsed_seconds, is_late, completed_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        ON CONFLICT (student_id, test_id) DO NOTHING
        RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.student_id)
    .bind(params.test_id)
    .bind(Json(params.answers))
    .bind(params.score)
    .bind(params.total_questions)
    .bind(params.percentage)
    .bind(params.time_taken_minutes)
    .bind(params.elapsed_seconds)
    .bind(params.is_late)
    .bind(params.completed_at)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_id: &str,
) -> Result<Option<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {COLUMNS} FROM test_results WHERE student_id = $1 AND test_id = $2"
    ))
    .bind(student_id)
    .bind(test_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn exists(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM test_results WHERE student_id = $1 AND test_id = $2)",
    )
    .bind(student_id)
    .bind(test_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<ResultSummary>, sqlx::Error> {
    sqlx::query_as::<_, ResultSummary>(
        "SELECT r.test_id, t.title AS test_title, r.score, r.total_questions, r.percentage,
                r.time_taken_minutes, r.is_late, r.completed_at
         FROM test_results r JOIN tests t ON t.id = r.test_id
         WHERE r.student_id = $1
         ORDER BY r.completed_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
