//! Submission handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    judge::Judge0Submission,
    middleware::auth::{AuthenticatedUser, OptionalAuth},
    models::SubmissionStatus,
    state::AppState,
    utils::page_bounds,
};

use super::{
    request::{CreateSubmissionRequest, ListSubmissionsQuery, StatusQuery},
    response::{
        CallbackResponse, CreateSubmissionResponse, SubmissionStatusResponse,
        SubmissionsListResponse,
    },
};

/// Create a new submission
pub async fn create_submission(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<Json<CreateSubmissionResponse>> {
    payload.validate()?;

    let submission = state.submissions().submit(Some(user.id), payload).await?;

    Ok(Json(CreateSubmissionResponse {
        id: submission.id,
        message: "Submission made successfully".to_string(),
    }))
}

/// Get a submission's aggregate status and its test cases
pub async fn get_submission(
    State(state): State<AppState>,
    OptionalAuth(auth_user): OptionalAuth,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<SubmissionStatusResponse>> {
    let caller = auth_user.map(|u| u.id);
    let response = state.submissions().get_status(caller, id).await?;

    if !query.refresh || response.submission.status != SubmissionStatus::Pending {
        return Ok(Json(response));
    }

    // A failed pull still answers with what is stored
    match state.reconciliation().refresh(id).await {
        Ok(0) => Ok(Json(response)),
        Ok(_) => Ok(Json(state.submissions().get_status(caller, id).await?)),
        Err(e) => {
            tracing::warn!(submission_id = %id, error = %e, "Refresh from Judge0 failed");
            Ok(Json(response))
        }
    }
}

/// List the caller's submissions for a problem
pub async fn list_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let (submissions, total) = state
        .submissions()
        .list_for_problem(auth_user.id, query.problem_id, page, per_page)
        .await?;

    Ok(Json(SubmissionsListResponse {
        submissions,
        total,
        page,
        per_page,
    }))
}

/// Judge0 callback, one per finished test case
pub async fn judge0_callback(
    State(state): State<AppState>,
    Json(payload): Json<Judge0Submission>,
) -> AppResult<Json<CallbackResponse>> {
    state.reconciliation().ingest_callback(payload).await?;

    Ok(Json(CallbackResponse {
        message: "Callback received".to_string(),
    }))
}
