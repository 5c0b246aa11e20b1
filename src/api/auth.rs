use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{normalize_email, validate_password_len, validation_error};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
};
use crate::schemas::user::UserResponse;
use crate::schemas::MessageResponse;
use crate::services::password_reset;

/// Max attempts per window for auth endpoints (login/register/password reset).
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, password reset instructions have been sent";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate().map_err(validation_error)?;
    validate_password_len(&payload.password)?;

    let email = normalize_email(&payload.email);
    enforce_rate_limit(&state, "register", &email, "Too many signup attempts, try again later")
        .await?;

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    // Self-registration always yields a student; admins come from bootstrap.
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            name: payload.name.trim(),
            hashed_password,
            role: UserRole::Student,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?
    .ok_or_else(|| ApiError::Conflict("Email already registered".to_string()))?;

    tracing::info!(user_id = %user.id, "Student registered");
    Ok((StatusCode::CREATED, Json(token_response(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    enforce_rate_limit(&state, "login", &email, "Too many login attempts, try again later").await?;

    let user = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    Ok(Json(token_response(&state, user)?))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.validate().map_err(validation_error)?;
    let email = normalize_email(&payload.email);
    enforce_rate_limit(&state, "forgot", &email, "Too many reset requests, try again later")
        .await?;

    if let Some(token) = password_reset::request(&state, &email).await? {
        // Delivery is handled outside this service; development builds log the token.
        if state.settings().runtime().environment.is_production() {
            tracing::info!("Password reset token issued");
        } else {
            tracing::info!(reset_token = %token, "Password reset token issued");
        }
    }

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.validate().map_err(validation_error)?;
    validate_password_len(&payload.new_password)?;
    let email = normalize_email(&payload.email);
    enforce_rate_limit(&state, "reset", &email, "Too many reset attempts, try again later").await?;

    password_reset::reset(&state, &email, &payload.reset_token, &payload.new_password).await?;

    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(&user.id, user.role, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    })
}

/// Redis outages never block authentication.
async fn enforce_rate_limit(
    state: &AppState,
    scope: &str,
    subject: &str,
    message: &'static str,
) -> Result<(), ApiError> {
    let rate_key = format!("rl:{scope}:{subject}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests(message))
    }
}
