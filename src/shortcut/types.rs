use serde::Deserialize;

/// A single state within a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowState {
    pub id: u64,
    pub name: String,
}

/// A workflow: a named set of states stories move through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub states: Vec<WorkflowState>,
}

impl Workflow {
    /// Resolve a state name to its id within this workflow.
    pub fn state_id(&self, name: &str) -> Option<u64> {
        self.states
            .iter()
            .find(|state| state.name == name)
            .map(|state| state.id)
    }
}

/// A pull request attached to a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LinkedPullRequest {
    pub number: u64,
}

/// The slice of a tracker story this tool reads and acts on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Story {
    pub id: u64,
    pub workflow_id: u64,
    pub workflow_state_id: u64,
    #[serde(default)]
    pub pull_requests: Vec<LinkedPullRequest>,
}

impl Story {
    /// True when the story lists `pull_request` among its attachments.
    pub fn references_pull_request(&self, pull_request: u64) -> bool {
        self.pull_requests
            .iter()
            .any(|pr| pr.number == pull_request)
    }
}
