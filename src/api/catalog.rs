use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::session::ResultSummaryResponse;
use crate::schemas::test::TestSummaryResponse;

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tests", get(list_tests))
        .route("/my-tests", get(my_tests))
        .route("/my-results", get(my_results))
}

/// Public catalog; answer keys never leave the admin endpoints.
async fn list_tests(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TestSummaryResponse>>, ApiError> {
    let tests = repositories::tests::list_active(state.db(), params.skip, params.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tests"))?;

    Ok(Json(tests.into_iter().map(TestSummaryResponse::from_db).collect()))
}

async fn my_tests(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
) -> Result<Json<Vec<TestSummaryResponse>>, ApiError> {
    let tests = repositories::tests::list_purchased(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list purchased tests"))?;

    Ok(Json(tests.into_iter().map(TestSummaryResponse::from_db).collect()))
}

async fn my_results(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
) -> Result<Json<Vec<ResultSummaryResponse>>, ApiError> {
    let results = repositories::results::list_by_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;

    Ok(Json(results.into_iter().map(ResultSummaryResponse::from_db).collect()))
}

fn default_limit() -> i64 {
    100
}
