use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::payments;
use crate::core::state::AppState;
use crate::schemas::cart::CartResponse;
use crate::schemas::payment::OrderResponse;
use crate::services::{cart, checkout};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add/:test_id", post(add_item))
        .route("/remove/:test_id", delete(remove_item))
        .route("/clear", delete(clear_cart))
        .route("/checkout", post(checkout_cart))
        .route("/verify-payment", post(payments::verify_payment))
}

async fn get_cart(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
) -> Result<Json<CartResponse>, ApiError> {
    let snapshot = cart::snapshot(&state, &student.id).await?;
    Ok(Json(CartResponse::from_snapshot(snapshot)))
}

async fn add_item(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(test_id): Path<String>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    cart::add(&state, &student.id, &test_id).await?;
    let snapshot = cart::snapshot(&state, &student.id).await?;
    Ok((StatusCode::CREATED, Json(CartResponse::from_snapshot(snapshot))))
}

async fn remove_item(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(test_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    cart::remove(&state, &student.id, &test_id).await?;
    let snapshot = cart::snapshot(&state, &student.id).await?;
    Ok(Json(CartResponse::from_snapshot(snapshot)))
}

async fn clear_cart(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
) -> Result<Json<CartResponse>, ApiError> {
    cart::clear(&state, &student.id).await?;
    let snapshot = cart::snapshot(&state, &student.id).await?;
    Ok(Json(CartResponse::from_snapshot(snapshot)))
}

async fn checkout_cart(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let handle = checkout::checkout_cart(&state, &student.id).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from_handle(handle))))
}
