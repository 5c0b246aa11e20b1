use rust_decimal::Decimal;
use sqlx::types::Json;

use crate::db::models::{OrderLine, PaymentOrder};
use crate::db::types::{PaymentPurpose, PaymentStatus};

const COLUMNS: &str = "\
    id, student_id, purpose, items, subtotal, discount, amount, currency, status, \
    payment_id, refund_amount, created_at, updated_at, verified_at";

pub(crate) struct CreateOrder<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) purpose: PaymentPurpose,
    pub(crate) items: Vec<OrderLine>,
    pub(crate) subtotal: Decimal,
    pub(crate) discount: Decimal,
    pub(crate) amount: Decimal,
    pub(crate) currency: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateOrder<'_>,
) -> Result<PaymentOrder, sqlx::Error> {
    sqlx::query_as::<_, PaymentOrder>(&format!(
        "INSERT INTO payment_orders (
            id, student_id, purpose, items, subtotal, discount, amount, currency, status,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.purpose)
    .bind(Json(params.items))
    .bind(params.subtotal)
    .bind(params.discount)
    .bind(params.amount)
    .bind(params.currency)
    .bind(PaymentStatus::Created)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Unpaid orders opened since `since` that include any of `test_ids`, newest first.
pub(crate) async fn list_pending_covering(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_ids: &[String],
    since: time::PrimitiveDateTime,
) -> Result<Vec<PaymentOrder>, sqlx::Error> {
    sqlx::query_as::<_, PaymentOrder>(&format!(
        "SELECT {COLUMNS} FROM payment_orders
         WHERE student_id = $1
           AND status = $2
           AND created_at >= $3
           AND EXISTS (
               SELECT 1 FROM jsonb_array_elements(items) AS line
               WHERE line->>'test_id' = ANY($4)
           )
         ORDER BY created_at DESC"
    ))
    .bind(student_id)
    .bind(PaymentStatus::Created)
    .bind(since)
    .bind(test_ids)
    .fetch_all(executor)
    .await
}

/// Row-locks the order for the rest of the transaction.
pub(crate) async fn lock_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<PaymentOrder>, sqlx::Error> {
    sqlx::query_as::<_, PaymentOrder>(&format!(
        "SELECT {COLUMNS} FROM payment_orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn mark_verified(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    payment_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payment_orders
         SET status = $1, payment_id = $2, verified_at = $3, updated_at = $3
         WHERE id = $4",
    )
    .bind(PaymentStatus::Verified)
    .bind(payment_id)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Only orders still in `created` move to `failed`; a verified order is never downgraded.
pub(crate) async fn mark_failed(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
    )
    .bind(PaymentStatus::Failed)
    .bind(now)
    .bind(id)
    .bind(PaymentStatus::Created)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Records a captured payment whose lines were partly or wholly owned already.
pub(crate) async fn flag_refund(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    refund_amount: Decimal,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payment_orders SET status = $1, refund_amount = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(PaymentStatus::RefundPending)
    .bind(refund_amount)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
