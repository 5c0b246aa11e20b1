use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::users::{CreateUser, UpdateUser};

const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Makes sure the configured admin account exists, is active and can log in
/// with the configured password.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    let email = admin.first_admin_email.trim().to_lowercase();
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_email(state.db(), &email).await? {
        let password_matches =
            security::verify_password(&admin.first_admin_password, &user.hashed_password)
                .unwrap_or(false);

        let hashed_password = if password_matches {
            None
        } else {
            Some(security::hash_password(&admin.first_admin_password)?)
        };
        let role = (user.role != UserRole::Admin).then_some(UserRole::Admin);
        let is_active = (!user.is_active).then_some(true);

        if hashed_password.is_none() && role.is_none() && is_active.is_none() {
            tracing::info!(email = %email, "Admin account already up to date");
            return Ok(());
        }

        repositories::users::update(
            state.db(),
            &user.id,
            UpdateUser { name: None, role, is_active, hashed_password, updated_at: now },
        )
        .await?;
        tracing::info!(email = %email, "Updated admin account");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;
    let created = repositories::users::create(
        state.db(),
        CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            name: DEFAULT_ADMIN_NAME,
            hashed_password,
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    match created {
        Some(_) => tracing::info!(email = %email, "Created admin account"),
        None => tracing::warn!(email = %email, "Admin account was created concurrently"),
    }
    Ok(())
}
