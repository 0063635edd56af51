//! Database repository for all data operations.
//!
//! Each write operation runs inside a single transaction: checks, candidate
//! selection, and writes all see one consistent snapshot, and any error
//! before commit rolls the whole operation back (dropping the transaction
//! aborts it). Candidate selection lives in exactly one place,
//! [`eligible_candidates`], shared by PR creation and reviewer reassignment.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    CreatePullRequestRequest, PrStatus, PullRequest, PullRequestDto, Review, Team, TeamDto,
    TeamMemberDto, User,
};

/// How many reviewers are assigned when a pull request is created.
pub const REVIEWERS_PER_PR: usize = 2;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== TEAM OPERATIONS ====================

    /// Create a team and upsert its members in one transaction.
    ///
    /// Fails with `TEAM_EXISTS` if the team name is already taken. Members
    /// listed in the request are inserted, or moved onto this team if their
    /// user id already exists.
    pub async fn add_team(&self, request: &TeamDto) -> Result<TeamDto, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM teams WHERE name = ?")
            .bind(&request.team_name)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(AppError::team_exists());
        }

        let team_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO teams (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&team_id)
            .bind(&request.team_name)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        for member in &request.members {
            sqlx::query(
                "INSERT INTO users (id, username, team_id, is_active) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    team_id = excluded.team_id,
                    is_active = excluded.is_active",
            )
            .bind(&member.id)
            .bind(&member.username)
            .bind(&team_id)
            .bind(member.is_active)
            .execute(&mut *tx)
            .await?;
        }

        let members = team_members_tx(&mut tx, &team_id).await?;
        tx.commit().await?;

        Ok(TeamDto {
            team_name: request.team_name.clone(),
            members: members.into_iter().map(member_dto).collect(),
        })
    }

    /// Get a team with its member roster by name.
    pub async fn get_team(&self, team_name: &str) -> Result<Option<TeamDto>, AppError> {
        let row = sqlx::query("SELECT id, name, created_at FROM teams WHERE name = ?")
            .bind(team_name)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let team = team_from_row(&row);

        let rows = sqlx::query(
            "SELECT id, username, team_id, is_active FROM users WHERE team_id = ? ORDER BY id",
        )
        .bind(&team.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TeamDto {
            team_name: team.name,
            members: rows
                .into_iter()
                .map(|r| member_dto(user_from_row(&r)))
                .collect(),
        }))
    }

    // ==================== USER OPERATIONS ====================

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT id, username, team_id, is_active FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Set a user's activation flag.
    ///
    /// This is the only writer of the flag; the assignment engine only ever
    /// reads it. Deactivation never retracts already-assigned reviews.
    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user not found".to_string()));
        }

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    // ==================== PULL REQUEST OPERATIONS ====================

    /// Create a pull request and assign up to two reviewers.
    ///
    /// Within one transaction: verifies the caller-supplied PR id is unused,
    /// resolves the author, and assigns the first `REVIEWERS_PER_PR` active
    /// non-author teammates in directory order. Fewer eligible teammates is
    /// not an error; the PR is simply created with fewer (or no) reviewers.
    pub async fn create_pull_request(
        &self,
        request: &CreatePullRequestRequest,
    ) -> Result<PullRequestDto, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM pull_requests WHERE id = ?")
            .bind(&request.pull_request_id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(AppError::pr_exists());
        }

        let author = get_user_tx(&mut tx, &request.author_id)
            .await?
            .ok_or_else(|| AppError::NotFound("author not found".to_string()))?;

        let members = team_members_tx(&mut tx, &author.team_id).await?;
        let none_assigned = HashSet::new();
        let reviewer_ids: Vec<String> = eligible_candidates(&members, &author.id, &none_assigned)
            .take(REVIEWERS_PER_PR)
            .map(|u| u.id.clone())
            .collect();

        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO pull_requests (id, name, author_id, status, created_at, merged_at)
             VALUES (?, ?, ?, ?, ?, NULL)",
        )
        .bind(&request.pull_request_id)
        .bind(&request.pull_request_name)
        .bind(&author.id)
        .bind(PrStatus::Open.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for reviewer_id in &reviewer_ids {
            sqlx::query(
                "INSERT INTO reviews (id, pull_request_id, reviewer_id, reviewed, assigned_at)
                 VALUES (?, ?, ?, 0, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&request.pull_request_id)
            .bind(reviewer_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            pr_id = %request.pull_request_id,
            reviewers = reviewer_ids.len(),
            "created pull request"
        );

        Ok(PullRequestDto {
            id: request.pull_request_id.clone(),
            pull_request_name: request.pull_request_name.clone(),
            author_id: author.id,
            status: PrStatus::Open,
            assigned_reviewers: reviewer_ids,
            created_at: now,
            merged_at: None,
        })
    }

    /// Transition a pull request to MERGED.
    ///
    /// Idempotent: merging an already-merged PR succeeds without touching
    /// the row, so the original merge timestamp is preserved.
    pub async fn merge_pull_request(&self, pr_id: &str) -> Result<PullRequestDto, AppError> {
        let mut tx = self.pool.begin().await?;

        let pr = get_pr_tx(&mut tx, pr_id)
            .await?
            .ok_or_else(|| AppError::NotFound("pr not found".to_string()))?;

        if pr.status == PrStatus::Merged {
            let reviewer_ids = reviewer_ids_tx(&mut tx, pr_id).await?;
            tx.commit().await?;
            return Ok(PullRequestDto::from_parts(pr, reviewer_ids));
        }

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE pull_requests SET status = ?, merged_at = ? WHERE id = ?")
            .bind(PrStatus::Merged.as_str())
            .bind(&now)
            .bind(pr_id)
            .execute(&mut *tx)
            .await?;

        let reviewer_ids = reviewer_ids_tx(&mut tx, pr_id).await?;
        tx.commit().await?;

        tracing::info!(pr_id = %pr_id, "merged pull request");

        Ok(PullRequestDto {
            status: PrStatus::Merged,
            merged_at: Some(now),
            ..PullRequestDto::from_parts(pr, reviewer_ids)
        })
    }

    /// Swap one currently assigned reviewer for an eligible teammate.
    ///
    /// Preconditions are checked in a fixed order inside one transaction:
    /// PR exists, PR not merged, the old reviewer actually holds a review
    /// row on this PR, the old reviewer's user record exists, and a
    /// replacement candidate exists. The swap is an in-place UPDATE of the
    /// existing review row's reviewer reference, so the row identity (and
    /// its `reviewed` flag) is preserved. After commit the PR and its full
    /// reviewer set are re-read so the response reflects committed state.
    pub async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequestDto, String), AppError> {
        let mut tx = self.pool.begin().await?;

        let pr = get_pr_tx(&mut tx, pr_id)
            .await?
            .ok_or_else(|| AppError::NotFound("pr not found".to_string()))?;

        if pr.status == PrStatus::Merged {
            return Err(AppError::pr_merged());
        }

        let review_row = sqlx::query("SELECT id FROM reviews WHERE pull_request_id = ? AND reviewer_id = ?")
            .bind(pr_id)
            .bind(old_reviewer_id)
            .fetch_optional(&mut *tx)
            .await?;
        let review_id: String = review_row
            .map(|row| row.get("id"))
            .ok_or_else(AppError::not_assigned)?;

        let old_reviewer = get_user_tx(&mut tx, old_reviewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        // Current assignee set, read fresh inside the transaction. The old
        // reviewer is part of it, which also rules them out as a candidate.
        let assigned: HashSet<String> = reviewer_ids_tx(&mut tx, pr_id).await?.into_iter().collect();

        let members = team_members_tx(&mut tx, &old_reviewer.team_id).await?;
        let replacement = eligible_candidates(&members, &pr.author_id, &assigned)
            .next()
            .map(|u| u.id.clone())
            .ok_or_else(AppError::no_candidate)?;

        sqlx::query("UPDATE reviews SET reviewer_id = ? WHERE id = ?")
            .bind(&replacement)
            .bind(&review_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            pr_id = %pr_id,
            old_reviewer = %old_reviewer_id,
            replacement = %replacement,
            "reassigned reviewer"
        );

        // Re-read after commit so the response reflects committed state.
        let pr = self
            .get_pull_request(pr_id)
            .await?
            .ok_or_else(|| AppError::Internal("pr missing after reassignment".to_string()))?;

        Ok((pr, replacement))
    }

    /// Get a pull request projection (row plus full reviewer id list).
    pub async fn get_pull_request(&self, pr_id: &str) -> Result<Option<PullRequestDto>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, author_id, status, created_at, merged_at FROM pull_requests WHERE id = ?",
        )
        .bind(pr_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let pr = pr_from_row(&row)?;

        let reviewer_ids = sqlx::query(
            "SELECT reviewer_id FROM reviews WHERE pull_request_id = ? ORDER BY reviewer_id",
        )
        .bind(pr_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| r.get("reviewer_id"))
        .collect();

        Ok(Some(PullRequestDto::from_parts(pr, reviewer_ids)))
    }

    /// List every pull request holding a review row for this user,
    /// regardless of PR status.
    pub async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<PullRequestDto>, AppError> {
        if self.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound("user not found".to_string()));
        }

        let pr_ids: Vec<String> = sqlx::query(
            "SELECT p.id FROM pull_requests p
             JOIN reviews r ON r.pull_request_id = p.id
             WHERE r.reviewer_id = ?
             ORDER BY p.created_at, p.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get("id"))
        .collect();

        let mut pull_requests = Vec::with_capacity(pr_ids.len());
        for pr_id in &pr_ids {
            if let Some(pr) = self.get_pull_request(pr_id).await? {
                pull_requests.push(pr);
            }
        }

        Ok(pull_requests)
    }

    /// List the review rows on a pull request in assignment order.
    pub async fn reviews_for_pull_request(&self, pr_id: &str) -> Result<Vec<Review>, AppError> {
        let rows = sqlx::query(
            "SELECT id, pull_request_id, reviewer_id, reviewed, assigned_at
             FROM reviews WHERE pull_request_id = ? ORDER BY assigned_at, id",
        )
        .bind(pr_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(review_from_row).collect())
    }
}

// ==================== CANDIDATE SELECTION ====================

/// Iterate reviewer candidates in directory order.
///
/// Directory order is ascending user id (an explicit policy so selection is
/// deterministic; `members` must already be sorted that way). A candidate is
/// an active user who is not the author and not in the excluded set (the
/// current assignees, for reassignment). Both PR creation and reassignment
/// draw from this single implementation.
fn eligible_candidates<'a>(
    members: &'a [User],
    author_id: &'a str,
    excluded: &'a HashSet<String>,
) -> impl Iterator<Item = &'a User> + 'a {
    members
        .iter()
        .filter(move |u| u.is_active && u.id != author_id && !excluded.contains(&u.id))
}

// ==================== IN-TRANSACTION READS ====================

async fn get_user_tx(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query("SELECT id, username, team_id, is_active FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

async fn get_pr_tx(conn: &mut SqliteConnection, id: &str) -> Result<Option<PullRequest>, AppError> {
    let row = sqlx::query(
        "SELECT id, name, author_id, status, created_at, merged_at FROM pull_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.as_ref().map(pr_from_row).transpose()
}

/// All users of a team in directory order (ascending user id).
async fn team_members_tx(conn: &mut SqliteConnection, team_id: &str) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query(
        "SELECT id, username, team_id, is_active FROM users WHERE team_id = ? ORDER BY id",
    )
    .bind(team_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

async fn reviewer_ids_tx(conn: &mut SqliteConnection, pr_id: &str) -> Result<Vec<String>, AppError> {
    let rows = sqlx::query(
        "SELECT reviewer_id FROM reviews WHERE pull_request_id = ? ORDER BY reviewer_id",
    )
    .bind(pr_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|r| r.get("reviewer_id")).collect())
}

// ==================== ROW MAPPING ====================

fn team_from_row(row: &SqliteRow) -> Team {
    Team {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        team_id: row.get("team_id"),
        is_active: row.get("is_active"),
    }
}

fn pr_from_row(row: &SqliteRow) -> Result<PullRequest, AppError> {
    let status: String = row.get("status");
    let status = PrStatus::from_str(&status)
        .ok_or_else(|| AppError::Internal(format!("unknown pull request status: {}", status)))?;

    Ok(PullRequest {
        id: row.get("id"),
        name: row.get("name"),
        author_id: row.get("author_id"),
        status,
        created_at: row.get("created_at"),
        merged_at: row.get("merged_at"),
    })
}

fn review_from_row(row: &SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        pull_request_id: row.get("pull_request_id"),
        reviewer_id: row.get("reviewer_id"),
        reviewed: row.get("reviewed"),
        assigned_at: row.get("assigned_at"),
    }
}

fn member_dto(user: User) -> TeamMemberDto {
    TeamMemberDto {
        id: user.id,
        username: user.username,
        is_active: user.is_active,
    }
}
