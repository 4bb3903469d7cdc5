use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

/// Name of the capture group a pull request pattern must define.
pub const PR_GROUP: &str = "pr";

/// A published release as delivered in the GitHub `release` event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Free-text release notes; GitHub sends `null` when there are none.
    pub body: Option<String>,
    pub name: Option<String>,
    pub tag_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Build a release from bare notes text, for callers that bypass the
    /// event payload (`--release-body`, tests).
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            name: None,
            tag_name: None,
            published_at: None,
        }
    }
}

/// Envelope of the `release` webhook event. `release` is absent when the
/// payload came from some other event type.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseEvent {
    pub action: Option<String>,
    pub release: Option<Release>,
}

/// Apply `pattern` to `text` and parse the named capture `group` as a
/// base-10 integer. Any failure along the way (no match, group absent from
/// the match, capture not numeric) yields `None` rather than an error.
pub(crate) fn numeric_capture(pattern: &Regex, text: &str, group: &str) -> Option<u64> {
    pattern.captures(text)?.name(group)?.as_str().parse().ok()
}

/// Extract pull request numbers from release notes.
///
/// The pattern is applied line by line, with each line trimmed of
/// surrounding whitespace first, and must expose a named capture group
/// `pr` holding the number. Lines that do not match, or whose capture does
/// not parse as an integer, contribute nothing. Result order follows line
/// order.
pub fn extract_pull_request_ids(text: &str, pattern: &Regex) -> Vec<u64> {
    text.lines()
        .filter_map(|line| numeric_capture(pattern, line.trim(), PR_GROUP))
        .collect()
}
