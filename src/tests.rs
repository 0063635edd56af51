//! Integration tests for the PRFlow backend.
//!
//! Each test spins up the real router against a throwaway SQLite database
//! and drives it over HTTP; row-level invariants (review counts, review row
//! identity) are asserted through the Repository handle.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Arc<Repository>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path, 5).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            max_connections: 5,
            log_level: "warn".to_string(),
        };

        let state = AppState {
            repo: Arc::clone(&repo),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            repo,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn add_team(&self, team_name: &str, members: Value) -> reqwest::Response {
        self.client
            .post(self.url("/team/add"))
            .json(&json!({ "team_name": team_name, "members": members }))
            .send()
            .await
            .unwrap()
    }

    async fn create_pr(&self, id: &str, name: &str, author_id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/pullRequest/create"))
            .json(&json!({
                "pull_request_id": id,
                "pull_request_name": name,
                "author_id": author_id
            }))
            .send()
            .await
            .unwrap()
    }

    async fn merge_pr(&self, id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/pullRequest/merge"))
            .json(&json!({ "pull_request_id": id }))
            .send()
            .await
            .unwrap()
    }

    async fn reassign(&self, pr_id: &str, old_reviewer_id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/pullRequest/reassign"))
            .json(&json!({
                "pull_request_id": pr_id,
                "old_reviewer_id": old_reviewer_id
            }))
            .send()
            .await
            .unwrap()
    }

    /// Team of five: author alice, active bob/carol/erin, inactive dave.
    /// Ids sort alphabetically, which is directory order.
    async fn seed_standard_team(&self) {
        let resp = self
            .add_team(
                "platform",
                json!([
                    { "user_id": "alice", "username": "Alice", "is_active": true },
                    { "user_id": "bob", "username": "Bob", "is_active": true },
                    { "user_id": "carol", "username": "Carol", "is_active": true },
                    { "user_id": "dave", "username": "Dave", "is_active": false },
                    { "user_id": "erin", "username": "Erin", "is_active": true }
                ]),
            )
            .await;
        assert_eq!(resp.status(), 201);
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_team_add_and_get() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;

    let resp = fixture
        .client
        .get(fixture.url("/team/get?team_name=platform"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["team_name"], "platform");

    let members = body["members"].as_array().unwrap();
    assert_eq!(members.len(), 5);
    // Directory order is ascending user id
    let ids: Vec<&str> = members
        .iter()
        .map(|m| m["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["alice", "bob", "carol", "dave", "erin"]);
    assert_eq!(members[3]["is_active"], false);
}

#[tokio::test]
async fn test_team_add_duplicate_name() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;

    let resp = fixture.add_team("platform", json!([])).await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "TEAM_EXISTS");
}

#[tokio::test]
async fn test_team_get_not_found() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/team/get?team_name=ghosts"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_set_is_active_toggles_flag() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;

    let resp = fixture
        .client
        .post(fixture.url("/users/setIsActive"))
        .json(&json!({ "user_id": "bob", "is_active": false }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["user_id"], "bob");
    assert_eq!(body["user"]["is_active"], false);

    let user = fixture.repo.get_user("bob").await.unwrap().unwrap();
    assert!(!user.is_active);
}

#[tokio::test]
async fn test_set_is_active_unknown_user() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/users/setIsActive"))
        .json(&json!({ "user_id": "nobody", "is_active": true }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_pr_assigns_first_two_active_teammates() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;

    let resp = fixture.create_pr("p1", "Add feature", "alice").await;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["pr"]["pull_request_id"], "p1");
    assert_eq!(body["pr"]["status"], "OPEN");
    assert_eq!(body["pr"]["author_id"], "alice");

    // First two active non-author teammates in directory order; dave is
    // inactive and erin comes after bob and carol.
    let reviewers = body["pr"]["assigned_reviewers"].as_array().unwrap();
    let ids: Vec<&str> = reviewers.iter().map(|r| r.as_str().unwrap()).collect();
    assert_eq!(ids, vec!["bob", "carol"]);

    let reviews = fixture.repo.reviews_for_pull_request("p1").await.unwrap();
    assert_eq!(reviews.len(), 2);
    assert!(reviews.iter().all(|r| r.reviewer_id != "alice"));
    assert!(reviews.iter().all(|r| !r.reviewed));
}

#[tokio::test]
async fn test_create_pr_author_only_team() {
    let fixture = TestFixture::new().await;
    let resp = fixture
        .add_team(
            "solo",
            json!([{ "user_id": "zoe", "username": "Zoe", "is_active": true }]),
        )
        .await;
    assert_eq!(resp.status(), 201);

    let resp = fixture.create_pr("p-solo", "Lone work", "zoe").await;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["pr"]["assigned_reviewers"].as_array().unwrap().len(), 0);

    let reviews = fixture.repo.reviews_for_pull_request("p-solo").await.unwrap();
    assert!(reviews.is_empty());
}

#[tokio::test]
async fn test_create_pr_single_eligible_teammate() {
    let fixture = TestFixture::new().await;
    let resp = fixture
        .add_team(
            "duo",
            json!([
                { "user_id": "ana", "username": "Ana", "is_active": true },
                { "user_id": "ben", "username": "Ben", "is_active": true },
                { "user_id": "cat", "username": "Cat", "is_active": false }
            ]),
        )
        .await;
    assert_eq!(resp.status(), 201);

    let resp = fixture.create_pr("p-duo", "Pair work", "ana").await;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["ben"]));
}

#[tokio::test]
async fn test_create_pr_duplicate_id() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;

    let resp = fixture.create_pr("p1", "Add feature", "alice").await;
    assert_eq!(resp.status(), 201);

    let resp = fixture.create_pr("p1", "Another one", "bob").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "PR_EXISTS");

    // The failed create leaves no new rows
    let reviews = fixture.repo.reviews_for_pull_request("p1").await.unwrap();
    assert_eq!(reviews.len(), 2);
    let pr = fixture.repo.get_pull_request("p1").await.unwrap().unwrap();
    assert_eq!(pr.author_id, "alice");
}

#[tokio::test]
async fn test_create_pr_unknown_author() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;

    let resp = fixture.create_pr("p-x", "Mystery", "nobody").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(fixture.repo.get_pull_request("p-x").await.unwrap().is_none());
}

#[tokio::test]
async fn test_merge_is_idempotent() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;
    fixture.create_pr("p1", "Add feature", "alice").await;

    let resp = fixture.merge_pr("p1").await;
    assert_eq!(resp.status(), 200);
    let first: Value = resp.json().await.unwrap();
    assert_eq!(first["pr"]["status"], "MERGED");
    let merged_at = first["pr"]["merged_at"].as_str().unwrap().to_string();

    // Second merge succeeds as a no-op with the original timestamp
    let resp = fixture.merge_pr("p1").await;
    assert_eq!(resp.status(), 200);
    let second: Value = resp.json().await.unwrap();
    assert_eq!(second["pr"]["status"], "MERGED");
    assert_eq!(second["pr"]["merged_at"].as_str().unwrap(), merged_at);
}

#[tokio::test]
async fn test_merge_unknown_pr() {
    let fixture = TestFixture::new().await;

    let resp = fixture.merge_pr("p-missing").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_reassign_replaces_reviewer_in_place() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;
    fixture.create_pr("p1", "Add feature", "alice").await;

    let before = fixture.repo.reviews_for_pull_request("p1").await.unwrap();
    let bob_row_id = before
        .iter()
        .find(|r| r.reviewer_id == "bob")
        .map(|r| r.id.clone())
        .unwrap();

    // Candidates: not bob (replaced), not alice (author), not carol
    // (assigned), not dave (inactive) -> erin
    let resp = fixture.reassign("p1", "bob").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["replaced_by"], "erin");

    let reviewers = body["pr"]["assigned_reviewers"].as_array().unwrap();
    let ids: Vec<&str> = reviewers.iter().map(|r| r.as_str().unwrap()).collect();
    assert_eq!(ids, vec!["carol", "erin"]);

    // The swap mutates the existing review row, not delete+insert
    let after = fixture.repo.reviews_for_pull_request("p1").await.unwrap();
    assert_eq!(after.len(), 2);
    let erin_row = after.iter().find(|r| r.reviewer_id == "erin").unwrap();
    assert_eq!(erin_row.id, bob_row_id);
    assert!(!erin_row.reviewed);
}

#[tokio::test]
async fn test_reassign_on_merged_pr() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;
    fixture.create_pr("p1", "Add feature", "alice").await;
    fixture.merge_pr("p1").await;

    let resp = fixture.reassign("p1", "bob").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "PR_MERGED");
    assert_eq!(body["error"]["message"], "cannot reassign on merged PR");

    // No review row was touched
    let reviews = fixture.repo.reviews_for_pull_request("p1").await.unwrap();
    let ids: Vec<&str> = reviews.iter().map(|r| r.reviewer_id.as_str()).collect();
    assert!(ids.contains(&"bob"));
}

#[tokio::test]
async fn test_reassign_reviewer_not_assigned() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;
    fixture.create_pr("p1", "Add feature", "alice").await;

    // erin is an active teammate but holds no review row on p1
    let resp = fixture.reassign("p1", "erin").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_ASSIGNED");
}

#[tokio::test]
async fn test_reassign_no_candidate() {
    let fixture = TestFixture::new().await;
    // Only three members: after alice's PR takes bob and carol, nobody is left
    let resp = fixture
        .add_team(
            "trio",
            json!([
                { "user_id": "alice", "username": "Alice", "is_active": true },
                { "user_id": "bob", "username": "Bob", "is_active": true },
                { "user_id": "carol", "username": "Carol", "is_active": true }
            ]),
        )
        .await;
    assert_eq!(resp.status(), 201);
    fixture.create_pr("p1", "Add feature", "alice").await;

    let resp = fixture.reassign("p1", "bob").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NO_CANDIDATE");
    assert_eq!(
        body["error"]["message"],
        "no active replacement candidate in team"
    );
}

#[tokio::test]
async fn test_reassign_skips_deactivated_candidate() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;
    fixture.create_pr("p1", "Add feature", "alice").await;

    // Deactivate the only unassigned teammate; reassignment has no candidate
    fixture
        .client
        .post(fixture.url("/users/setIsActive"))
        .json(&json!({ "user_id": "erin", "is_active": false }))
        .send()
        .await
        .unwrap();

    let resp = fixture.reassign("p1", "bob").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NO_CANDIDATE");
}

#[tokio::test]
async fn test_reassign_unknown_pr() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;

    let resp = fixture.reassign("p-missing", "bob").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_reviews_for_user() {
    let fixture = TestFixture::new().await;
    fixture.seed_standard_team().await;
    fixture.create_pr("p1", "Add feature", "alice").await;
    fixture.create_pr("p2", "Fix bug", "alice").await;
    fixture.merge_pr("p2").await;

    // bob reviews both PRs; merged PRs stay in the list
    let resp = fixture
        .client
        .get(fixture.url("/users/getReview?user_id=bob"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user_id"], "bob");

    let prs = body["pull_requests"].as_array().unwrap();
    assert_eq!(prs.len(), 2);
    let ids: Vec<&str> = prs
        .iter()
        .map(|p| p["pull_request_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(prs[1]["status"], "MERGED");

    // Inactive users keep their history: deactivating bob retracts nothing
    fixture
        .client
        .post(fixture.url("/users/setIsActive"))
        .json(&json!({ "user_id": "bob", "is_active": false }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/users/getReview?user_id=bob"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["pull_requests"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_reviews_unknown_user() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/users/getReview?user_id=nobody"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    // Missing team name
    let resp = fixture.add_team("", json!([])).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_PAYLOAD");

    // Empty PR id
    let resp = fixture.create_pr("", "No id", "alice").await;
    assert_eq!(resp.status(), 400);
}
