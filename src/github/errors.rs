use thiserror::Error;

/// Failures talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Api(#[from] octocrab::Error),

    #[error("invalid GitHub API base URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: octocrab::Error,
    },
}
