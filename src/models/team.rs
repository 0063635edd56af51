//! Team model and the team-facing wire DTOs.

use serde::{Deserialize, Serialize};

/// A team owning zero or more users. Team names are unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// One member entry on the team wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberDto {
    #[serde(rename = "user_id")]
    pub id: String,
    pub username: String,
    pub is_active: bool,
}

/// Team as exposed on the wire: name plus its member roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDto {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMemberDto>,
}

/// Response body for POST /team/add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAddResponse {
    pub team: TeamDto,
}
