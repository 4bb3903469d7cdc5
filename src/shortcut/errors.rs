use thiserror::Error;

/// Failures talking to the Shortcut API. Every operation is a single
/// attempt; callers decide what a failure means for the wider run.
#[derive(Debug, Error)]
pub enum ShortcutError {
    #[error("request to Shortcut failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Shortcut rejected {operation}: HTTP {status}")]
    UnexpectedStatus {
        operation: String,
        status: reqwest::StatusCode,
    },

    #[error("Shortcut returned an unparseable body for {operation}: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Shortcut returned an empty body for story {id}")]
    EmptyStory { id: u64 },
}
