use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::github::{CommentSource, GitHubError};
use crate::linkage::{LinkageResolver, LinkedStory, SHORTCUT_BOT_LOGIN};
use crate::release::{extract_pull_request_ids, Release};
use crate::shortcut::{ShortcutClient, ShortcutError, Workflow};

/// Workflow name to target state name, as configured by the operator.
pub type StateMap = HashMap<String, String>;

/// Transport failure from either side of the fence. Configuration
/// mismatches (unknown workflow, unmapped workflow, unknown state name)
/// are not errors; they are logged and the story is left alone.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Shortcut(#[from] ShortcutError),
}

/// Knobs for a transition run.
#[derive(Debug, Clone)]
pub struct TransitionOptions {
    /// Workflow name -> target state name.
    pub state_map: StateMap,
    /// Applied per release-notes line; must capture `pr`.
    pub pr_pattern: Regex,
    /// Comment author recognized as the linkage bot.
    pub bot_login: String,
    /// Resolve and decide, but skip the tracker writes.
    pub dry_run: bool,
}

impl TransitionOptions {
    pub fn new(state_map: StateMap, pr_pattern: Regex) -> Self {
        Self {
            state_map,
            pr_pattern,
            bot_login: SHORTCUT_BOT_LOGIN.to_string(),
            dry_run: false,
        }
    }
}

/// A state change applied (or, under dry-run, that would be applied) to a
/// story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryTransition {
    pub story: u64,
    pub from: u64,
    pub to: u64,
}

/// What happened to a single pull request during a run.
#[derive(Debug)]
pub enum PullRequestOutcome {
    Processed {
        pull_request: u64,
        transitions: Vec<StoryTransition>,
        /// Linked stories that needed no write.
        skipped: usize,
    },
    Failed {
        pull_request: u64,
        error: TransitionError,
    },
}

/// Outcome of a whole run. A run never fails as a whole; per-pull-request
/// results are collected here.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<PullRequestOutcome>,
}

impl RunReport {
    /// Pull requests the release referenced.
    pub fn pull_requests(&self) -> usize {
        self.outcomes.len()
    }

    pub fn transitioned(&self) -> usize {
        self.transitions().count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, PullRequestOutcome::Failed { .. }))
            .count()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StoryTransition> {
        self.outcomes.iter().flat_map(|outcome| match outcome {
            PullRequestOutcome::Processed { transitions, .. } => transitions.as_slice(),
            PullRequestOutcome::Failed { .. } => &[],
        })
    }
}

/// Drives one release through extraction, linkage resolution, and state
/// transitions.
pub struct TransitionEngine<C> {
    comments: C,
    tracker: ShortcutClient,
    options: TransitionOptions,
}

impl<C: CommentSource> TransitionEngine<C> {
    pub fn new(comments: C, tracker: ShortcutClient, options: TransitionOptions) -> Self {
        Self {
            comments,
            tracker,
            options,
        }
    }

    /// Process one published release. Failures while handling one pull
    /// request are contained to that pull request.
    pub async fn run(&self, release: &Release) -> RunReport {
        let body = release.body.as_deref().unwrap_or_default();
        let pull_requests = extract_pull_request_ids(body, &self.options.pr_pattern);
        if pull_requests.is_empty() {
            info!("release references no pull requests");
            return RunReport::default();
        }
        debug!(count = pull_requests.len(), "release references pull requests");

        // Workflow taxonomy is fetched at most once per run, and only once
        // a linked story actually needs it.
        let mut workflows: Option<Vec<Workflow>> = None;

        let mut report = RunReport::default();
        for pull_request in pull_requests {
            match self.process_pull_request(pull_request, &mut workflows).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(error) => {
                    warn!(
                        pull_request,
                        error = %error,
                        "failed to process pull request; continuing with the rest"
                    );
                    report
                        .outcomes
                        .push(PullRequestOutcome::Failed { pull_request, error });
                }
            }
        }
        report
    }

    async fn process_pull_request(
        &self,
        pull_request: u64,
        workflows: &mut Option<Vec<Workflow>>,
    ) -> Result<PullRequestOutcome, TransitionError> {
        let resolver =
            LinkageResolver::new(&self.comments, &self.tracker, &self.options.bot_login);
        let stories = resolver.resolve_linked_stories(pull_request).await?;

        let mut transitions = Vec::new();
        let mut skipped = 0;
        for story in stories {
            match self.transition_story(&story, workflows).await? {
                Some(transition) => transitions.push(transition),
                None => skipped += 1,
            }
        }
        Ok(PullRequestOutcome::Processed {
            pull_request,
            transitions,
            skipped,
        })
    }

    /// Move one story to its configured state, if the taxonomy and the
    /// state map agree one exists and the story is not already there.
    async fn transition_story(
        &self,
        story: &LinkedStory,
        cache: &mut Option<Vec<Workflow>>,
    ) -> Result<Option<StoryTransition>, TransitionError> {
        if cache.is_none() {
            let fetched = self.tracker.list_workflows().await?;
            debug!(count = fetched.len(), "loaded workflow taxonomy");
            *cache = Some(fetched);
        }
        let workflows = cache.as_deref().unwrap_or_default();

        let workflow = match workflows.iter().find(|w| w.id == story.workflow_id) {
            Some(workflow) => workflow,
            None => {
                error!(
                    story = story.id,
                    workflow = story.workflow_id,
                    "story belongs to a workflow the tracker does not list"
                );
                return Ok(None);
            }
        };

        let target_name = match self.options.state_map.get(&workflow.name) {
            Some(name) => name,
            None => {
                info!(
                    story = story.id,
                    workflow = %workflow.name,
                    "no target state configured for workflow; leaving story as-is"
                );
                return Ok(None);
            }
        };

        let target = match workflow.state_id(target_name) {
            Some(id) => id,
            None => {
                info!(
                    story = story.id,
                    workflow = %workflow.name,
                    state = %target_name,
                    "configured state does not exist in workflow; leaving story as-is"
                );
                return Ok(None);
            }
        };

        if target == story.workflow_state_id {
            debug!(
                story = story.id,
                state = target,
                "story already in target state"
            );
            return Ok(None);
        }

        let transition = StoryTransition {
            story: story.id,
            from: story.workflow_state_id,
            to: target,
        };
        if self.options.dry_run {
            info!(
                story = transition.story,
                from = transition.from,
                to = transition.to,
                "dry run: would update story state"
            );
            return Ok(Some(transition));
        }

        debug!(story = story.id, state = target, "updating story state");
        self.tracker.set_story_state(story.id, target).await?;
        debug!(story = story.id, state = target, "story state updated");
        Ok(Some(transition))
    }
}
