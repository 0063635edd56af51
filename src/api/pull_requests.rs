//! Pull request API endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::models::{
    CreatePullRequestRequest, MergePullRequestRequest, PullRequestResponse, ReassignRequest,
    ReassignResponse,
};
use crate::AppState;

/// POST /pullRequest/create - Create a PR and assign reviewers.
pub async fn create_pull_request(
    State(state): State<AppState>,
    Json(request): Json<CreatePullRequestRequest>,
) -> Result<(StatusCode, Json<PullRequestResponse>), AppError> {
    if request.pull_request_id.trim().is_empty() {
        return Err(AppError::Validation("pull_request_id is required".to_string()));
    }
    if request.pull_request_name.trim().is_empty() {
        return Err(AppError::Validation("pull_request_name is required".to_string()));
    }
    if request.author_id.trim().is_empty() {
        return Err(AppError::Validation("author_id is required".to_string()));
    }

    let pr = state.repo.create_pull_request(&request).await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// POST /pullRequest/merge - Transition a PR to MERGED (idempotent).
pub async fn merge_pull_request(
    State(state): State<AppState>,
    Json(request): Json<MergePullRequestRequest>,
) -> Result<Json<PullRequestResponse>, AppError> {
    if request.pull_request_id.trim().is_empty() {
        return Err(AppError::Validation("pull_request_id is required".to_string()));
    }

    let pr = state.repo.merge_pull_request(&request.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// POST /pullRequest/reassign - Swap an assigned reviewer for a teammate.
pub async fn reassign_reviewer(
    State(state): State<AppState>,
    Json(request): Json<ReassignRequest>,
) -> Result<Json<ReassignResponse>, AppError> {
    if request.pull_request_id.trim().is_empty() {
        return Err(AppError::Validation("pull_request_id is required".to_string()));
    }
    if request.old_reviewer_id.trim().is_empty() {
        return Err(AppError::Validation("old_reviewer_id is required".to_string()));
    }

    let (pr, replaced_by_id) = state
        .repo
        .reassign_reviewer(&request.pull_request_id, &request.old_reviewer_id)
        .await?;

    Ok(Json(ReassignResponse { pr, replaced_by_id }))
}
