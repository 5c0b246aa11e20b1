use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::user::UserResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(email(message = "email is not valid"))]
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ForgotPasswordRequest {
    #[validate(email(message = "email is not valid"))]
    pub(crate) email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ResetPasswordRequest {
    #[validate(email(message = "email is not valid"))]
    pub(crate) email: String,
    #[serde(alias = "resetToken", alias = "token")]
    #[validate(length(min = 1, message = "reset_token must not be empty"))]
    pub(crate) reset_token: String,
    #[serde(alias = "newPassword")]
    pub(crate) new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_bad_email() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "not-an-email",
            "password": "long-enough-password"
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn reset_accepts_camel_case_aliases() {
        let request: ResetPasswordRequest = serde_json::from_value(serde_json::json!({
            "email": "asha@example.com",
            "resetToken": "abc",
            "newPassword": "new-password-123"
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.reset_token, "abc");
    }
}
