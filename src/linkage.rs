use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::engine::TransitionError;
use crate::github::CommentSource;
use crate::release::numeric_capture;
use crate::shortcut::ShortcutClient;

/// Login of the Shortcut GitHub App that posts linkage announcements.
pub const SHORTCUT_BOT_LOGIN: &str = "shortcut-integration[bot]";

/// Announcement the bot posts when a story gets connected to a pull
/// request. The `id` group carries the story id.
static LINKAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This pull request has been linked to \[Shortcut Story #(?<id>\d+):")
        .expect("linkage pattern is valid")
});

/// A story confirmed to be linked to a pull request, with its current
/// workflow position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedStory {
    pub id: u64,
    pub workflow_id: u64,
    pub workflow_state_id: u64,
}

/// Resolves which tracker stories a pull request is linked to, by way of
/// the bot comments on its issue thread.
pub struct LinkageResolver<'a, C> {
    comments: &'a C,
    tracker: &'a ShortcutClient,
    bot_login: &'a str,
}

impl<'a, C: CommentSource> LinkageResolver<'a, C> {
    pub fn new(comments: &'a C, tracker: &'a ShortcutClient, bot_login: &'a str) -> Self {
        Self {
            comments,
            tracker,
            bot_login,
        }
    }

    /// Stories the bot announced on this pull request that genuinely list
    /// the pull request among their own attachments.
    ///
    /// Duplicate announcements are kept: each one is fetched and verified
    /// independently. A failure fetching any story aborts resolution for
    /// this pull request.
    pub async fn resolve_linked_stories(
        &self,
        pull_request: u64,
    ) -> Result<Vec<LinkedStory>, TransitionError> {
        let comments = self.comments.issue_comments(pull_request).await?;

        let mut linked = Vec::new();
        for comment in &comments {
            if comment.author_login != self.bot_login {
                continue;
            }
            let story_id = match numeric_capture(&LINKAGE_PATTERN, &comment.body, "id") {
                Some(id) => id,
                None => continue,
            };

            let story = self.tracker.get_story(story_id).await?;
            if story.pull_requests.is_empty() {
                debug!(story = story.id, "story has no attached pull requests; ignoring");
                continue;
            }
            if !story.references_pull_request(pull_request) {
                debug!(
                    story = story.id,
                    pull_request, "story does not reference this pull request; ignoring"
                );
                continue;
            }

            linked.push(LinkedStory {
                id: story_id,
                workflow_id: story.workflow_id,
                workflow_state_id: story.workflow_state_id,
            });
        }

        debug!(
            pull_request,
            stories = linked.len(),
            "resolved linked stories"
        );
        Ok(linked)
    }
}
