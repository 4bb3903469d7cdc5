//! Shared builders for the wiremock-backed API tests.
#![allow(dead_code)] // Shared across test crates; not every crate uses every helper

use std::collections::HashMap;

use serde_json::{json, Value};
use wiremock::matchers::{any, body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use story_porter::github::{CommentSource, GitHubClient, GitHubError, IssueComment};
use story_porter::shortcut::ShortcutClient;
use story_porter::StateMap;

/// Login the Shortcut integration bot comments under.
pub const BOT_LOGIN: &str = "shortcut-integration[bot]";

/// Repository coordinates used across the API tests.
pub const OWNER: &str = "test-owner";
pub const REPO: &str = "test-repo";

pub const GITHUB_TOKEN: &str = "github-test-token";
pub const SHORTCUT_TOKEN: &str = "shortcut-test-token";

/// Body of a linkage announcement for `story_id`, as the bot writes it.
pub fn linkage_body(story_id: u64) -> String {
    format!(
        "This pull request has been linked to [Shortcut Story #{story_id}: Ship the thing]\
         (https://app.shortcut.com/acme/story/{story_id})."
    )
}

/// Complete user object as GitHub returns it; octocrab insists on every
/// field being present.
pub fn user_json(login: &str) -> Value {
    json!({
        "login": login,
        "id": 97_000_001,
        "node_id": "MDQ6VXNlcjk3MDAwMDAx",
        "avatar_url": "https://avatars.githubusercontent.com/u/97000001?v=4",
        "gravatar_id": "",
        "url": format!("https://api.github.com/users/{login}"),
        "html_url": format!("https://github.com/{login}"),
        "followers_url": format!("https://api.github.com/users/{login}/followers"),
        "following_url": format!("https://api.github.com/users/{login}/following{{/other_user}}"),
        "gists_url": format!("https://api.github.com/users/{login}/gists{{/gist_id}}"),
        "starred_url": format!("https://api.github.com/users/{login}/starred{{/owner}}{{/repo}}"),
        "subscriptions_url": format!("https://api.github.com/users/{login}/subscriptions"),
        "organizations_url": format!("https://api.github.com/users/{login}/orgs"),
        "repos_url": format!("https://api.github.com/users/{login}/repos"),
        "events_url": format!("https://api.github.com/users/{login}/events{{/privacy}}"),
        "received_events_url": format!("https://api.github.com/users/{login}/received_events"),
        "type": "User",
        "site_admin": false
    })
}

/// Full issue-comment object, deserializable by octocrab.
pub fn comment_json(id: u64, login: &str, body: &str) -> Value {
    json!({
        "id": id,
        "node_id": format!("IC_{id}"),
        "url": format!("https://api.github.com/repos/{OWNER}/{REPO}/issues/comments/{id}"),
        "html_url": format!("https://github.com/{OWNER}/{REPO}/pull/1#issuecomment-{id}"),
        "issue_url": format!("https://api.github.com/repos/{OWNER}/{REPO}/issues/1"),
        "body": body,
        "user": user_json(login),
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z",
        "author_association": "NONE"
    })
}

/// A comment whose body GitHub reports as null.
pub fn bodyless_comment_json(id: u64, login: &str) -> Value {
    let mut comment = comment_json(id, login, "");
    comment["body"] = Value::Null;
    comment
}

pub fn workflow_json(id: u64, name: &str, states: &[(u64, &str)]) -> Value {
    json!({
        "id": id,
        "name": name,
        "states": states
            .iter()
            .map(|(state_id, state_name)| json!({ "id": state_id, "name": state_name }))
            .collect::<Vec<_>>(),
    })
}

/// The two-workflow taxonomy the scenario tests share.
pub fn standard_workflows() -> Value {
    Value::Array(vec![
        workflow_json(
            2000,
            "Workflow1",
            &[(2001, "InDevelopment"), (2002, "Completed"), (2003, "Deployed")],
        ),
        workflow_json(
            3000,
            "Workflow2",
            &[(3001, "InDevelopment"), (3002, "Completed"), (3003, "Deployed")],
        ),
    ])
}

pub fn story_json(id: u64, workflow_id: u64, workflow_state_id: u64, pull_requests: &[u64]) -> Value {
    json!({
        "id": id,
        "workflow_id": workflow_id,
        "workflow_state_id": workflow_state_id,
        "pull_requests": pull_requests
            .iter()
            .map(|number| json!({ "number": number }))
            .collect::<Vec<_>>(),
    })
}

pub fn state_map(pairs: &[(&str, &str)]) -> StateMap {
    pairs
        .iter()
        .map(|(workflow, state)| (workflow.to_string(), state.to_string()))
        .collect()
}

/// Mock of the GitHub issues API surface the release flow touches.
pub struct GitHubIssuesMock {
    pub server: MockServer,
}

impl GitHubIssuesMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_uri(&self) -> String {
        self.server.uri()
    }

    /// Single page of comments for an issue.
    pub async fn mock_comments(&self, issue_number: u64, comments: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/repos/{OWNER}/{REPO}/issues/{issue_number}/comments"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(comments)))
            .mount(&self.server)
            .await;
    }

    /// Comment listing failing with the given status.
    pub async fn mock_comments_failure(&self, issue_number: u64, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/repos/{OWNER}/{REPO}/issues/{issue_number}/comments"
            )))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "message": "Server Error",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&self.server)
            .await;
    }

    /// Two pages of comments chained with a rel="next" Link header.
    pub async fn mock_paginated_comments(
        &self,
        issue_number: u64,
        first: Vec<Value>,
        second: Vec<Value>,
    ) {
        let comments_path = format!("/repos/{OWNER}/{REPO}/issues/{issue_number}/comments");
        let next = format!("{}{comments_path}?per_page=100&page=2", self.server.uri());

        // Mounted first so the page=2 request is claimed before the
        // catch-all below.
        Mock::given(method("GET"))
            .and(path(comments_path.clone()))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(second)))
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(comments_path))
            .and(query_param("per_page", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(Value::Array(first))
                    .append_header("Link", format!("<{next}>; rel=\"next\"").as_str()),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Assert nothing reaches the GitHub API at all.
    pub async fn expect_no_calls(&self) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

/// Mock of the Shortcut API.
pub struct ShortcutApiMock {
    pub server: MockServer,
}

impl ShortcutApiMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// The standard taxonomy, expected to be fetched exactly `times` times.
    pub async fn mock_workflows(&self, times: u64) {
        Mock::given(method("GET"))
            .and(path("/workflows"))
            .and(header("Shortcut-Token", SHORTCUT_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(standard_workflows()))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_story(&self, id: u64, story: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/stories/{id}")))
            .and(header("Shortcut-Token", SHORTCUT_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(story))
            .mount(&self.server)
            .await;
    }

    /// Story fetch with an exact expected call count.
    pub async fn mock_story_expect(&self, id: u64, story: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/stories/{id}")))
            .and(header("Shortcut-Token", SHORTCUT_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(story))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_story_failure(&self, id: u64, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/stories/{id}")))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "message": "boom" })),
            )
            .mount(&self.server)
            .await;
    }

    /// Expect exactly `times` state writes for `id`, carrying
    /// `workflow_state_id` in the body. Replies 200 with an empty body,
    /// like the real API.
    pub async fn mock_story_update(&self, id: u64, workflow_state_id: u64, times: u64) {
        Mock::given(method("PUT"))
            .and(path(format!("/stories/{id}")))
            .and(header("Shortcut-Token", SHORTCUT_TOKEN))
            .and(body_json(json!({ "workflow_state_id": workflow_state_id })))
            .respond_with(ResponseTemplate::new(200))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Assert no story is written at all.
    pub async fn expect_no_story_updates(&self) {
        Mock::given(method("PUT"))
            .and(path_regex(r"^/stories/\d+$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Assert nothing reaches the tracker at all.
    pub async fn expect_no_calls(&self) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

pub fn github_client(mock: &GitHubIssuesMock) -> GitHubClient {
    GitHubClient::with_base_uri(GITHUB_TOKEN, &mock.base_uri(), OWNER, REPO)
        .expect("mock base uri is valid")
}

pub fn shortcut_client(mock: &ShortcutApiMock) -> ShortcutClient {
    ShortcutClient::with_base_url(SHORTCUT_TOKEN, &mock.base_url())
}

/// Hand-rolled comment source for driving the resolver without a server.
pub struct FakeComments {
    pub threads: HashMap<u64, Vec<IssueComment>>,
}

impl FakeComments {
    pub fn single_thread(issue: u64, comments: Vec<IssueComment>) -> Self {
        Self {
            threads: HashMap::from([(issue, comments)]),
        }
    }
}

#[async_trait::async_trait]
impl CommentSource for FakeComments {
    async fn issue_comments(&self, issue_number: u64) -> Result<Vec<IssueComment>, GitHubError> {
        Ok(self
            .threads
            .get(&issue_number)
            .cloned()
            .unwrap_or_default())
    }
}

/// Comment source that always fails, for exercising error propagation.
pub struct FailingComments;

#[async_trait::async_trait]
impl CommentSource for FailingComments {
    async fn issue_comments(&self, _issue_number: u64) -> Result<Vec<IssueComment>, GitHubError> {
        Err(invalid_base_uri_error())
    }
}

/// Manufacture a real GitHubError without any network access.
pub fn invalid_base_uri_error() -> GitHubError {
    match GitHubClient::with_base_uri("token", "not a valid uri", OWNER, REPO) {
        Err(error) => error,
        Ok(_) => panic!("base uri should not have parsed"),
    }
}

pub fn bot_comment(body: &str) -> IssueComment {
    IssueComment {
        author_login: BOT_LOGIN.to_string(),
        body: body.to_string(),
    }
}

pub fn human_comment(login: &str, body: &str) -> IssueComment {
    IssueComment {
        author_login: login.to_string(),
        body: body.to_string(),
    }
}
