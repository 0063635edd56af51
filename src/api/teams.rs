//! Team API endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{TeamAddResponse, TeamDto};
use crate::AppState;

/// POST /team/add - Create a team with its member roster.
pub async fn add_team(
    State(state): State<AppState>,
    Json(request): Json<TeamDto>,
) -> Result<(StatusCode, Json<TeamAddResponse>), AppError> {
    if request.team_name.trim().is_empty() {
        return Err(AppError::Validation("team_name is required".to_string()));
    }
    for member in &request.members {
        if member.id.trim().is_empty() {
            return Err(AppError::Validation("member user_id is required".to_string()));
        }
    }

    let team = state.repo.add_team(&request).await?;
    Ok((StatusCode::CREATED, Json(TeamAddResponse { team })))
}

/// Query parameters for GET /team/get.
#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: String,
}

/// GET /team/get?team_name=... - Get a team with its members.
pub async fn get_team(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<TeamDto>, AppError> {
    if query.team_name.trim().is_empty() {
        return Err(AppError::Validation("team_name required".to_string()));
    }

    match state.repo.get_team(&query.team_name).await? {
        Some(team) => Ok(Json(team)),
        None => Err(AppError::NotFound("team not found".to_string())),
    }
}
