use sqlx::PgPool;

use crate::db::models::CartLine;

/// Inserts the line unless it is already present; `false` means duplicate.
pub(crate) async fn add(
    pool: &PgPool,
    student_id: &str,
    test_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO cart_items (student_id, test_id, added_at) VALUES ($1,$2,$3)
         ON CONFLICT (student_id, test_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(test_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn remove(pool: &PgPool, student_id: &str, test_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE student_id = $1 AND test_id = $2")
        .bind(student_id)
        .bind(test_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn clear(pool: &PgPool, student_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE student_id = $1")
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn remove_many(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_ids: &[String],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE student_id = $1 AND test_id = ANY($2)")
        .bind(student_id)
        .bind(test_ids)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Cart lines joined with their tests, oldest first. Lines for deactivated tests are skipped.
pub(crate) async fn list_lines(pool: &PgPool, student_id: &str) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as::<_, CartLine>(
        "SELECT c.test_id, t.title, t.price, t.duration_minutes, c.added_at
         FROM cart_items c JOIN tests t ON t.id = c.test_id
         WHERE c.student_id = $1 AND t.is_active
         ORDER BY c.added_at, c.test_id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
