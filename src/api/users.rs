//! User API endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{ReviewListResponse, SetIsActiveRequest, SetIsActiveResponse};
use crate::AppState;

/// POST /users/setIsActive - Toggle a user's activation flag.
pub async fn set_is_active(
    State(state): State<AppState>,
    Json(request): Json<SetIsActiveRequest>,
) -> Result<Json<SetIsActiveResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }

    let user = state
        .repo
        .set_is_active(&request.user_id, request.is_active)
        .await?;

    Ok(Json(SetIsActiveResponse { user: user.into() }))
}

/// Query parameters for GET /users/getReview.
#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub user_id: String,
}

/// GET /users/getReview?user_id=... - List the PRs this user reviews.
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    if query.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id required".to_string()));
    }

    let pull_requests = state.repo.reviews_for_user(&query.user_id).await?;

    Ok(Json(ReviewListResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}
