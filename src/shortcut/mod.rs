pub mod client;
pub mod errors;
pub mod types;

pub use client::{ShortcutClient, SHORTCUT_API_URL};
pub use errors::ShortcutError;
pub use types::{LinkedPullRequest, Story, Workflow, WorkflowState};
