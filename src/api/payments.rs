use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::schemas::payment::{OrderResponse, VerifyPaymentRequest, VerifyPaymentResponse};
use crate::services::checkout;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tests/:test_id/purchase", post(purchase_test))
        .route("/verify-payment", post(verify_payment))
}

async fn purchase_test(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(test_id): Path<String>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let handle = checkout::purchase_single(&state, &student.id, &test_id).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from_handle(handle))))
}

/// Shared by single purchases and cart checkouts; the order remembers which one it is.
pub(crate) async fn verify_payment(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    if payload.order_id.trim().is_empty() || payload.payment_id.trim().is_empty() {
        return Err(ApiError::BadRequest("order_id and payment_id are required".to_string()));
    }

    let verified = checkout::verify_payment(
        &state,
        &student.id,
        payload.order_id.trim(),
        payload.payment_id.trim(),
        &payload.signature,
    )
    .await?;

    Ok(Json(VerifyPaymentResponse::from_verified(verified)))
}
