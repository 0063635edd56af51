//! User model and the user-facing wire DTOs.

use serde::{Deserialize, Serialize};

use super::PullRequestDto;

/// A user belonging to exactly one team.
///
/// The `is_active` flag is the sole eligibility gate for reviewer selection;
/// inactive users keep their historical reviews but never receive new ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub team_id: String,
    pub is_active: bool,
}

/// User as exposed on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    #[serde(rename = "user_id")]
    pub id: String,
    pub username: String,
    pub team_id: String,
    pub is_active: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            team_id: user.team_id,
            is_active: user.is_active,
        }
    }
}

/// Request body for POST /users/setIsActive.
#[derive(Debug, Clone, Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

/// Response body for POST /users/setIsActive.
#[derive(Debug, Clone, Serialize)]
pub struct SetIsActiveResponse {
    pub user: UserDto,
}

/// Response body for GET /users/getReview.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewListResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestDto>,
}
