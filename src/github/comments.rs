use async_trait::async_trait;
use tracing::debug;

use super::client::GitHubClient;
use super::errors::GitHubError;

/// Comments are pulled in pages of this size, the GitHub maximum.
const COMMENTS_PAGE_SIZE: u8 = 100;

/// Minimal view of an issue comment: just enough to recognize linkage
/// announcements. A comment without a body projects to an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    pub author_login: String,
    pub body: String,
}

/// Source of issue comments for a fixed repository. Implemented by the
/// real client below and by hand-rolled fakes in tests.
#[async_trait]
pub trait CommentSource {
    /// Every comment on the issue, first page to last.
    async fn issue_comments(&self, issue_number: u64) -> Result<Vec<IssueComment>, GitHubError>;
}

#[async_trait]
impl CommentSource for GitHubClient {
    async fn issue_comments(&self, issue_number: u64) -> Result<Vec<IssueComment>, GitHubError> {
        let page = self
            .octocrab()
            .issues(self.owner(), self.repo())
            .list_comments(issue_number)
            .per_page(COMMENTS_PAGE_SIZE)
            .send()
            .await?;
        let comments = self.octocrab().all_pages(page).await?;

        debug!(
            issue = issue_number,
            count = comments.len(),
            "fetched issue comments"
        );

        Ok(comments
            .into_iter()
            .map(|comment| IssueComment {
                author_login: comment.user.login,
                body: comment.body.unwrap_or_default(),
            })
            .collect())
    }
}
