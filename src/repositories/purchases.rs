use rust_decimal::Decimal;
use uuid::Uuid;

pub(crate) async fn exists(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM purchases WHERE student_id = $1 AND test_id = $2)")
        .bind(student_id)
        .bind(test_id)
        .fetch_one(executor)
        .await
}

/// Ids among `test_ids` the student already owns.
pub(crate) async fn owned_among(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT test_id FROM purchases WHERE student_id = $1 AND test_id = ANY($2)")
        .bind(student_id)
        .bind(test_ids)
        .fetch_all(executor)
        .await
}

/// Grants the entitlement once per (student, test). Returns `false` when it already existed.
pub(crate) async fn grant(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_id: &str,
    order_id: &str,
    price_paid: Decimal,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO purchases (id, student_id, test_id, order_id, price_paid, purchased_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         ON CONFLICT (student_id, test_id) DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(student_id)
    .bind(test_id)
    .bind(order_id)
    .bind(price_paid)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
