use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;
use tracing::{error, info, Instrument};

use story_porter::config::{parse_state_map, StoryPorterConfig};
use story_porter::engine::{TransitionEngine, TransitionOptions};
use story_porter::github::GitHubClient;
use story_porter::release::{extract_pull_request_ids, Release, ReleaseEvent, PR_GROUP};
use story_porter::shortcut::ShortcutClient;
use story_porter::telemetry;

#[derive(Parser)]
#[command(name = "story-porter")]
#[command(about = "Moves linked Shortcut stories to a configured workflow state when a GitHub release ships")]
#[command(long_about = "story-porter reads a published release, extracts the pull requests its notes \
                       reference, finds the Shortcut stories linked to them through the integration \
                       bot's comments, and moves each story to the state configured for its workflow.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a published release: extract PRs, resolve linked stories, move them
    Run {
        /// Path to a GitHub event payload file
        #[arg(long, help = "Event payload to read; defaults to $GITHUB_EVENT_PATH")]
        event_file: Option<PathBuf>,
        /// Release notes to process instead of reading an event payload
        #[arg(long, help = "Use this text as the release notes, skipping the event payload")]
        release_body: Option<String>,
        /// JSON object mapping workflow names to target state names
        #[arg(long, help = "Override the configured workflow-to-state mapping")]
        to_state: Option<String>,
        /// Pattern applied to each release-notes line; must capture `pr`
        #[arg(long, help = "Override the configured pull request pattern")]
        pr_pattern: Option<String>,
        /// Resolve and decide, but write nothing to the tracker
        #[arg(long, help = "Log intended story transitions without applying them")]
        dry_run: bool,
    },
    /// Print the pull request numbers a release body references
    Extract {
        /// Release notes; read from stdin when omitted
        #[arg(long, help = "Release notes text; stdin is read when this is omitted")]
        release_body: Option<String>,
        /// Pattern applied to each line; must capture `pr`
        #[arg(long, help = "Override the configured pull request pattern")]
        pr_pattern: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            event_file,
            release_body,
            to_state,
            pr_pattern,
            dry_run,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            run_command(event_file, release_body, to_state, pr_pattern, dry_run).await
        }),
        Commands::Extract {
            release_body,
            pr_pattern,
        } => extract_command(release_body, pr_pattern),
    }
}

async fn run_command(
    event_file: Option<PathBuf>,
    release_body: Option<String>,
    to_state: Option<String>,
    pr_pattern: Option<String>,
    dry_run: bool,
) -> Result<()> {
    StoryPorterConfig::load_env_file()?;
    let config = StoryPorterConfig::load()?;
    telemetry::init_telemetry(&config.observability.log_level)?;

    let state_map = match to_state {
        Some(raw) => parse_state_map(&raw)?,
        None => config.release.to_state.clone(),
    };
    let pattern = compile_pr_pattern(pr_pattern.as_deref().unwrap_or(&config.release.pr_pattern))?;

    let release = match load_release(event_file, release_body).await? {
        Some(release) => release,
        None => {
            error!("event payload has no release; was this invoked on release published?");
            return Ok(());
        }
    };
    let published_at = release.published_at.map(|at| at.to_rfc3339());
    info!(
        tag = release.tag_name.as_deref(),
        name = release.name.as_deref(),
        published_at = published_at.as_deref(),
        "processing release"
    );

    let github_token = config
        .github
        .token
        .clone()
        .context("GitHub token not configured (set GITHUB_TOKEN or STORY_PORTER_GITHUB__TOKEN)")?;
    let shortcut_token = config.shortcut.token.clone().context(
        "Shortcut token not configured (set SHORTCUT_TOKEN or STORY_PORTER_SHORTCUT__TOKEN)",
    )?;
    if config.github.owner.is_empty() || config.github.repo.is_empty() {
        bail!("repository not configured (set GITHUB_REPOSITORY or [github] owner/repo)");
    }

    let github = match &config.github.api_url {
        Some(url) => GitHubClient::with_base_uri(
            &github_token,
            url,
            &config.github.owner,
            &config.github.repo,
        )?,
        None => GitHubClient::new(&github_token, &config.github.owner, &config.github.repo)?,
    };
    let shortcut = match &config.shortcut.api_url {
        Some(url) => ShortcutClient::with_base_url(&shortcut_token, url),
        None => ShortcutClient::new(&shortcut_token),
    };

    let mut options = TransitionOptions::new(state_map, pattern);
    options.bot_login = config.release.bot_login.clone();
    options.dry_run = dry_run;

    let correlation_id = telemetry::generate_correlation_id();
    let span = telemetry::release_run_span(release.tag_name.as_deref(), &correlation_id);
    let engine = TransitionEngine::new(github, shortcut, options);
    let report = engine.run(&release).instrument(span).await;

    info!(
        pull_requests = report.pull_requests(),
        transitioned = report.transitioned(),
        failed = report.failed(),
        dry_run,
        "release processed"
    );
    println!(
        "📦 Release processed: {} pull requests, {} story transitions, {} failures",
        report.pull_requests(),
        report.transitioned(),
        report.failed()
    );
    Ok(())
}

fn extract_command(release_body: Option<String>, pr_pattern: Option<String>) -> Result<()> {
    let config = StoryPorterConfig::load()?;
    let pattern = compile_pr_pattern(pr_pattern.as_deref().unwrap_or(&config.release.pr_pattern))?;

    let body = match release_body {
        Some(body) => body,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read release notes from stdin")?;
            buffer
        }
    };

    for id in extract_pull_request_ids(&body, &pattern) {
        println!("{id}");
    }
    Ok(())
}

/// Compile the caller-supplied pattern and insist on the `pr` group; a
/// pattern without it would silently match nothing.
fn compile_pr_pattern(raw: &str) -> Result<Regex> {
    let pattern =
        Regex::new(raw).with_context(|| format!("invalid pull request pattern {raw:?}"))?;
    if !pattern
        .capture_names()
        .flatten()
        .any(|name| name == PR_GROUP)
    {
        bail!("pull request pattern {raw:?} has no `pr` capture group");
    }
    Ok(pattern)
}

async fn load_release(
    event_file: Option<PathBuf>,
    release_body: Option<String>,
) -> Result<Option<Release>> {
    if let Some(body) = release_body {
        return Ok(Some(Release::from_body(body)));
    }

    let path = match event_file {
        Some(path) => path,
        None => PathBuf::from(
            std::env::var("GITHUB_EVENT_PATH")
                .context("no --event-file given and GITHUB_EVENT_PATH is not set")?,
        ),
    };
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read event payload from {}", path.display()))?;
    let event: ReleaseEvent = serde_json::from_str(&raw)
        .with_context(|| format!("event payload at {} is not valid JSON", path.display()))?;
    if let Some(action) = &event.action {
        info!(action = %action, "loaded release event");
    }
    Ok(event.release)
}
