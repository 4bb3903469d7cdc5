use octocrab::Octocrab;

use super::errors::GitHubError;

/// Client bound to the repository whose releases are being processed.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Client against api.github.com.
    pub fn new(token: &str, owner: &str, repo: &str) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()?;

        Ok(GitHubClient {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Client against a non-default API endpoint (GitHub Enterprise, or a
    /// mock server in tests).
    pub fn with_base_uri(
        token: &str,
        base_uri: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(base_uri)
            .map_err(|source| GitHubError::BaseUrl {
                url: base_uri.to_string(),
                source,
            })?
            .build()?;

        Ok(GitHubClient {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub(crate) fn octocrab(&self) -> &Octocrab {
        &self.octocrab
    }
}
