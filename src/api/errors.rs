use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::password_reset::ResetError;
use crate::services::pricing::PricingError;
use crate::services::questions::QuestionError;
use crate::services::test_session::SessionError;

const PAYMENT_VERIFICATION_FAILED: &str = "Payment verification failed";

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Unauthorized(message) => {
                let mut response = error_body(status, message.to_string());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
            ApiError::Forbidden(message) | ApiError::TooManyRequests(message) => message.to_string(),
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
            ApiError::BadGateway(message) => {
                tracing::error!(error = %message, "Upstream gateway failure");
                "Payment gateway unavailable, try again later".to_string()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                message
            }
        };
        error_body(status, detail)
    }
}

fn error_body(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::NegativePrice(_) => ApiError::BadRequest(err.to_string()),
            PricingError::InvalidTier(_) => ApiError::internal(err, "Bundle pricing misconfigured"),
        }
    }
}

impl From<QuestionError> for ApiError {
    fn from(err: QuestionError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::TestNotFound | CartError::ItemNotFound => ApiError::NotFound(err.to_string()),
            CartError::DuplicateItem | CartError::AlreadyPurchased => {
                ApiError::Conflict(err.to_string())
            }
            CartError::Pricing(err) => err.into(),
            CartError::Database(err) => ApiError::internal(err, "Failed to update cart"),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::TestNotFound | CheckoutError::OrderNotFound => {
                ApiError::NotFound(err.to_string())
            }
            CheckoutError::AlreadyPurchased
            | CheckoutError::PaymentMismatch
            | CheckoutError::PaymentPending
            | CheckoutError::DuplicatePayment => ApiError::Conflict(err.to_string()),
            CheckoutError::EmptyCart | CheckoutError::ZeroTotal | CheckoutError::InvalidAmount(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CheckoutError::InvalidSignature => {
                ApiError::BadRequest(PAYMENT_VERIFICATION_FAILED.to_string())
            }
            CheckoutError::Gateway(err) => ApiError::BadGateway(err.to_string()),
            CheckoutError::Pricing(err) => err.into(),
            CheckoutError::Database(err) => ApiError::internal(err, "Failed to process payment"),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::TestNotFound | SessionError::NotCompleted => {
                ApiError::NotFound(err.to_string())
            }
            SessionError::NotPurchased => ApiError::Forbidden("Test not purchased"),
            SessionError::AlreadyCompleted => ApiError::Conflict(err.to_string()),
            SessionError::NotInProgress | SessionError::InvalidAnswerCount { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            SessionError::Database(err) => ApiError::internal(err, "Failed to process test session"),
        }
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::InvalidToken => ApiError::BadRequest(err.to_string()),
            ResetError::Security(err) => ApiError::internal(err, "Failed to hash password"),
            ResetError::Database(err) => ApiError::internal(err, "Failed to reset password"),
        }
    }
}
