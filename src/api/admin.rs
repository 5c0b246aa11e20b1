use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::validation_error;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::test::{
    BulkQuestionsUpload, BulkUploadResponse, TestCreate, TestDetailResponse, TestSummaryResponse,
};
use crate::schemas::user::UserResponse;
use crate::schemas::MessageResponse;
use crate::services::questions::{self, RawQuestion};

#[derive(Debug, Deserialize)]
struct StudentListParams {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tests", get(list_tests).post(create_test))
        .route("/tests/:test_id", get(get_test).delete(delete_test))
        .route("/students", get(list_students))
        .route("/bulk-upload-questions", post(bulk_upload_questions))
}

async fn list_tests(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<Json<Vec<TestSummaryResponse>>, ApiError> {
    let tests = repositories::tests::list_by_author(state.db(), &admin.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tests"))?;

    Ok(Json(tests.into_iter().map(TestSummaryResponse::from_db).collect()))
}

async fn create_test(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<TestCreate>,
) -> Result<(StatusCode, Json<TestDetailResponse>), ApiError> {
    payload.validate().map_err(validation_error)?;
    let validated = questions::validate_all(payload.questions.into_iter().map(RawQuestion::from))?;

    let now = primitive_now_utc();
    let test_id = Uuid::new_v4().to_string();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let test = repositories::tests::create(
        &mut *tx,
        repositories::tests::CreateTest {
            id: &test_id,
            title: payload.title.trim(),
            description: payload.description.trim(),
            price: payload.price,
            duration_minutes: payload.duration_minutes,
            created_by: &admin.id,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test"))?;

    repositories::questions::append(&mut *tx, &test_id, 0, validated)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store questions"))?;

    let stored = repositories::questions::list_by_test(&mut *tx, &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit test"))?;

    tracing::info!(test_id = %test.id, questions = stored.len(), "Test created");
    Ok((StatusCode::CREATED, Json(TestDetailResponse::from_db(test, stored))))
}

async fn get_test(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(test_id): Path<String>,
) -> Result<Json<TestDetailResponse>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let stored = repositories::questions::list_by_test(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    Ok(Json(TestDetailResponse::from_db(test, stored)))
}

/// Soft delete: owners keep access to purchased tests and their results.
async fn delete_test(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(test_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deactivated = repositories::tests::deactivate(state.db(), &test_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete test"))?;

    if !deactivated {
        return Err(ApiError::NotFound("Test not found".to_string()));
    }

    tracing::info!(test_id = %test_id, "Test deactivated");
    Ok(Json(MessageResponse::new("Test deleted successfully")))
}

async fn list_students(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(params): Query<StudentListParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let students =
        repositories::users::list_by_role(state.db(), UserRole::Student, params.skip, params.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    Ok(Json(students.into_iter().map(UserResponse::from_db).collect()))
}

/// Appends already-parsed spreadsheet rows to an existing test. Refused while any
/// session on the test is still open, since its answer sheet is sized at issue time.
async fn bulk_upload_questions(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<BulkQuestionsUpload>,
) -> Result<(StatusCode, Json<BulkUploadResponse>), ApiError> {
    let validated = questions::validate_all(payload.questions.into_iter().map(RawQuestion::from))?;

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::tests::lock_for_update(&mut *tx, &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .filter(|test| test.is_active)
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let in_progress = repositories::sessions::has_in_progress(&mut *tx, &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check test sessions"))?;
    if in_progress {
        return Err(ApiError::Conflict(
            "Cannot add questions while students are taking this test".to_string(),
        ));
    }

    let first_position = repositories::questions::next_position(&mut *tx, &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    let questions_added =
        repositories::questions::append(&mut *tx, &payload.test_id, first_position, validated)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store questions"))?;

    let now = primitive_now_utc();
    repositories::tests::touch(&mut *tx, &payload.test_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update test"))?;

    let questions_count = repositories::questions::count_by_test(&mut *tx, &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit questions"))?;

    tracing::info!(test_id = %payload.test_id, questions_added, "Questions uploaded");
    Ok((
        StatusCode::CREATED,
        Json(BulkUploadResponse { test_id: payload.test_id, questions_added, questions_count }),
    ))
}

fn default_limit() -> i64 {
    100
}
