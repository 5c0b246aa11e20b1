use crate::db::models::TestSession;
use crate::db::types::SessionStatus;

const COLUMNS: &str = "id, status, started_at, deadline_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) deadline_at: time::PrimitiveDateTime,
}

/// Starts the session unless one already exists for (student, test).
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO test_sessions (id, student_id, test_id, status, started_at, deadline_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         ON CONFLICT (student_id, test_id) DO NOTHING",
    )
    .bind(session.id)
    .bind(session.student_id)
    .bind(session.test_id)
    .bind(SessionStatus::InProgress)
    .bind(session.started_at)
    .bind(session.deadline_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_id: &str,
) -> Result<Option<TestSession>, sqlx::Error> {
    sqlx::query_as::<_, TestSession>(&format!(
        "SELECT {COLUMNS} FROM test_sessions WHERE student_id = $1 AND test_id = $2"
    ))
    .bind(student_id)
    .bind(test_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn lock_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_id: &str,
) -> Result<Option<TestSession>, sqlx::Error> {
    sqlx::query_as::<_, TestSession>(&format!(
        "SELECT {COLUMNS} FROM test_sessions WHERE student_id = $1 AND test_id = $2 FOR UPDATE"
    ))
    .bind(student_id)
    .bind(test_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn has_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM test_sessions WHERE test_id = $1 AND status = $2)",
    )
    .bind(test_id)
    .bind(SessionStatus::InProgress)
    .fetch_one(executor)
    .await
}

pub(crate) async fn submit(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE test_sessions SET status = $1, submitted_at = $2 WHERE id = $3")
        .bind(SessionStatus::Submitted)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
