//! Pull request and review models plus their wire DTOs.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a pull request.
///
/// A PR is created OPEN and transitions exactly once, irreversibly, to
/// MERGED. There is no other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrStatus {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "MERGED")]
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "OPEN",
            PrStatus::Merged => "MERGED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(PrStatus::Open),
            "MERGED" => Some(PrStatus::Merged),
            _ => None,
        }
    }
}

/// A pull request row. Identity is caller-supplied and globally unique.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub created_at: String,
    pub merged_at: Option<String>,
}

/// A review row linking one reviewer to one pull request.
///
/// At most one row exists per (pull request, reviewer) pair while assigned.
/// The `reviewed` flag is persisted but not written by any exposed operation.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: String,
    pub pull_request_id: String,
    pub reviewer_id: String,
    pub reviewed: bool,
    pub assigned_at: String,
}

/// Pull request projection as exposed on the wire, including the full
/// reviewer id list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestDto {
    #[serde(rename = "pull_request_id")]
    pub id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
}

impl PullRequestDto {
    pub fn from_parts(pr: PullRequest, reviewer_ids: Vec<String>) -> Self {
        Self {
            id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: reviewer_ids,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

/// Request body for POST /pullRequest/create.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

/// Request body for POST /pullRequest/merge.
#[derive(Debug, Clone, Deserialize)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

/// Request body for POST /pullRequest/reassign.
#[derive(Debug, Clone, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_reviewer_id: String,
}

/// Response body for POST /pullRequest/create and /pullRequest/merge.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequestDto,
}

/// Response body for POST /pullRequest/reassign.
#[derive(Debug, Clone, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequestDto,
    #[serde(rename = "replaced_by")]
    pub replaced_by_id: String,
}
