use uuid::Uuid;

use crate::db::models::PasswordResetToken;

const COLUMNS: &str = "id, user_id, token_hash, expires_at, used_at, created_at";

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    token_hash: &str,
    expires_at: time::PrimitiveDateTime,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, created_at)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Unused tokens of a user stop working once a newer one is issued or a reset succeeds.
pub(crate) async fn invalidate_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used_at = $1 WHERE user_id = $2 AND used_at IS NULL",
    )
    .bind(now)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn lock_by_hash(
    executor: impl sqlx::PgExecutor<'_>,
    token_hash: &str,
) -> Result<Option<PasswordResetToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(&format!(
        "SELECT {COLUMNS} FROM password_reset_tokens WHERE token_hash = $1 FOR UPDATE"
    ))
    .bind(token_hash)
    .fetch_optional(executor)
    .await
}
