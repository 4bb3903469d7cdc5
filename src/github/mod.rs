pub mod client;
pub mod comments;
pub mod errors;

pub use client::GitHubClient;
pub use comments::{CommentSource, IssueComment};
pub use errors::GitHubError;
