// Story Porter Library - Release-driven Shortcut story transitions
// This exposes the core components for testing and integration

pub mod config;
pub mod engine;
pub mod github;
pub mod linkage;
pub mod release;
pub mod shortcut;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{parse_state_map, StoryPorterConfig, DEFAULT_PR_PATTERN};
pub use engine::{
    PullRequestOutcome, RunReport, StateMap, StoryTransition, TransitionEngine, TransitionError,
    TransitionOptions,
};
pub use github::{CommentSource, GitHubClient, GitHubError, IssueComment};
pub use linkage::{LinkageResolver, LinkedStory, SHORTCUT_BOT_LOGIN};
pub use release::{extract_pull_request_ids, Release, ReleaseEvent};
pub use shortcut::{ShortcutClient, ShortcutError, Story, Workflow, WorkflowState};
pub use telemetry::{generate_correlation_id, init_telemetry, release_run_span};
