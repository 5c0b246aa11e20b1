use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::Duration;

use crate::core::{security, state::AppState, time::primitive_now_utc};
use crate::repositories;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub(crate) enum ResetError {
    #[error("Invalid or expired reset token")]
    InvalidToken,
    #[error(transparent)]
    Security(#[from] security::SecurityError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

/// Issues a fresh token for the account behind `email`, if any. Earlier unused
/// tokens of that account stop working. The plain token is returned to the caller
/// for delivery and never stored.
pub(crate) async fn request(state: &AppState, email: &str) -> Result<Option<String>, ResetError> {
    let Some(user) = repositories::users::find_by_email(state.db(), email).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }

    let token = generate_token();
    let now = primitive_now_utc();
    let expires_at =
        now + Duration::minutes(state.settings().security().password_reset_expire_minutes as i64);

    let mut tx = state.db().begin().await?;
    repositories::password_resets::invalidate_for_user(&mut *tx, &user.id, now).await?;
    repositories::password_resets::create(&mut *tx, &user.id, &hash_token(&token), expires_at, now)
        .await?;
    tx.commit().await?;

    Ok(Some(token))
}

/// Consumes the token once and stores the new password hash.
pub(crate) async fn reset(
    state: &AppState,
    email: &str,
    token: &str,
    new_password: &str,
) -> Result<(), ResetError> {
    let mut tx = state.db().begin().await?;
    let Some(stored) =
        repositories::password_resets::lock_by_hash(&mut *tx, &hash_token(token)).await?
    else {
        return Err(ResetError::InvalidToken);
    };

    let now = primitive_now_utc();
    if stored.used_at.is_some() || stored.expires_at <= now {
        return Err(ResetError::InvalidToken);
    }

    let user = repositories::users::find_by_id(state.db(), &stored.user_id)
        .await?
        .filter(|user| user.email.eq_ignore_ascii_case(email.trim()))
        .ok_or(ResetError::InvalidToken)?;

    let hashed_password = security::hash_password(new_password)?;
    repositories::users::update(
        &mut *tx,
        &user.id,
        repositories::users::UpdateUser {
            name: None,
            role: None,
            is_active: None,
            hashed_password: Some(hashed_password),
            updated_at: now,
        },
    )
    .await?;
    repositories::password_resets::invalidate_for_user(&mut *tx, &user.id, now).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(())
}
