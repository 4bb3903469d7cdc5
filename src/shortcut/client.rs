use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::errors::ShortcutError;
use super::types::{Story, Workflow};

/// Production Shortcut API endpoint.
pub const SHORTCUT_API_URL: &str = "https://api.app.shortcut.com/api/v3";

/// Header carrying the API credential.
const TOKEN_HEADER: &str = "Shortcut-Token";

/// Minimal Shortcut REST client covering the three calls the release flow
/// needs. One HTTP round-trip per operation, no retries.
#[derive(Debug, Clone)]
pub struct ShortcutClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ShortcutClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, SHORTCUT_API_URL)
    }

    /// Client against a non-default endpoint, for tests and proxies.
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Fetch every workflow together with its states.
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, ShortcutError> {
        let request = self.http.get(format!("{}/workflows", self.base_url));
        let workflows = self
            .execute::<Vec<Workflow>>("list workflows", request)
            .await?
            .unwrap_or_default();
        Ok(workflows)
    }

    /// Fetch a single story.
    pub async fn get_story(&self, id: u64) -> Result<Story, ShortcutError> {
        let request = self.http.get(format!("{}/stories/{id}", self.base_url));
        self.execute(&format!("get story {id}"), request)
            .await?
            .ok_or(ShortcutError::EmptyStory { id })
    }

    /// Move a story to the given workflow state. Succeeds on any 2xx; the
    /// response body, if any, is discarded.
    pub async fn set_story_state(
        &self,
        id: u64,
        workflow_state_id: u64,
    ) -> Result<(), ShortcutError> {
        let body = serde_json::json!({ "workflow_state_id": workflow_state_id });
        let request = self
            .http
            .put(format!("{}/stories/{id}", self.base_url))
            .body(body.to_string());
        self.execute::<serde_json::Value>(&format!("update story {id}"), request)
            .await?;
        Ok(())
    }

    /// Send one request with the credential and content-type headers
    /// attached. Non-2xx statuses become errors; a 2xx with an empty body
    /// becomes `None`.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ShortcutError> {
        let response = request
            .header(TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), "shortcut responded");
        if !status.is_success() {
            return Err(ShortcutError::UnexpectedStatus {
                operation: operation.to_string(),
                status,
            });
        }
        let body = response.text().await?;
        if body.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| ShortcutError::Decode {
                operation: operation.to_string(),
                source,
            })
    }
}
