use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::schemas::session::{
    SolutionsResponse, SubmitTestRequest, SubmitTestResponse, TakeTestResponse,
};
use crate::services::test_session::{self, Submission};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tests/:test_id/take", get(take_test))
        .route("/tests/:test_id/submit", post(submit_test))
        .route("/test-solutions/:test_id", get(test_solutions))
}

async fn take_test(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(test_id): Path<String>,
) -> Result<Json<TakeTestResponse>, ApiError> {
    let issued = test_session::issue(&state, &student.id, &test_id).await?;
    Ok(Json(TakeTestResponse::from_issued(issued)))
}

async fn submit_test(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(test_id): Path<String>,
    Json(payload): Json<SubmitTestRequest>,
) -> Result<Json<SubmitTestResponse>, ApiError> {
    if payload.time_taken_minutes.is_some_and(|minutes| minutes < 0) {
        return Err(ApiError::BadRequest("time_taken_minutes must be non-negative".to_string()));
    }

    let submitted = test_session::submit(
        &state,
        &student.id,
        &test_id,
        Submission { answers: payload.answers, time_taken_minutes: payload.time_taken_minutes },
    )
    .await?;

    Ok(Json(SubmitTestResponse::from_submitted(submitted)))
}

async fn test_solutions(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(test_id): Path<String>,
) -> Result<Json<SolutionsResponse>, ApiError> {
    let solutions = test_session::solutions(&state, &student.id, &test_id).await?;
    Ok(Json(SolutionsResponse::from_solutions(solutions)))
}
