use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::StateMap;
use crate::linkage::SHORTCUT_BOT_LOGIN;

/// Default pattern for pulling PR numbers out of release notes: the
/// `(#123)` suffix GitHub appends to squash-merge commit titles.
pub const DEFAULT_PR_PATTERN: &str = r"\(#(?<pr>\d+)\)";

/// Main configuration structure for story-porter
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoryPorterConfig {
    /// GitHub configuration
    pub github: GitHubConfig,
    /// Shortcut configuration
    pub shortcut: ShortcutConfig,
    /// Release processing rules
    pub release: ReleaseConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var)
    pub token: Option<String>,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// API base URL override (GitHub Enterprise)
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ShortcutConfig {
    /// Shortcut API token (can be set via env var)
    pub token: Option<String>,
    /// API base URL override
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Pattern applied to each release-notes line; must capture `pr`
    pub pr_pattern: String,
    /// Workflow name -> target state name
    pub to_state: StateMap,
    /// Comment author recognized as the linkage bot
    pub bot_login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            pr_pattern: DEFAULT_PR_PATTERN.to_string(),
            to_state: StateMap::new(),
            bot_login: SHORTCUT_BOT_LOGIN.to_string(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl StoryPorterConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (story-porter.toml)
    /// 3. Environment variables (prefixed with STORY_PORTER_, sections
    ///    separated by a double underscore, e.g. STORY_PORTER_RELEASE__BOT_LOGIN)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("story-porter.toml").exists() {
            builder = builder.add_source(File::with_name("story-porter"));
        }

        // A double-underscore section separator keeps leaf names like
        // `bot_login` and `pr_pattern` addressable.
        builder = builder.add_source(
            Environment::with_prefix("STORY_PORTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut loaded: StoryPorterConfig = config.try_deserialize()?;

        // Tokens and repository coordinates fall back to the variables a
        // GitHub Actions environment already provides.
        if loaded.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                loaded.github.token = Some(token);
            }
        }
        if loaded.shortcut.token.is_none() {
            if let Ok(token) = std::env::var("SHORTCUT_TOKEN") {
                loaded.shortcut.token = Some(token);
            } else if let Ok(token) = std::env::var("CLUBHOUSE_TOKEN") {
                // Name from before the vendor's rename.
                loaded.shortcut.token = Some(token);
            }
        }
        if loaded.github.owner.is_empty() || loaded.github.repo.is_empty() {
            if let Ok(repository) = std::env::var("GITHUB_REPOSITORY") {
                if let Some((owner, repo)) = repository.split_once('/') {
                    if loaded.github.owner.is_empty() {
                        loaded.github.owner = owner.to_string();
                    }
                    if loaded.github.repo.is_empty() {
                        loaded.github.repo = repo.to_string();
                    }
                }
            }
        }
        if loaded.github.api_url.is_none() {
            if let Ok(url) = std::env::var("GITHUB_API_URL") {
                loaded.github.api_url = Some(url);
            }
        }

        Ok(loaded)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Parse a `to-state` value: a JSON object mapping workflow names to state
/// names.
pub fn parse_state_map(raw: &str) -> Result<StateMap> {
    serde_json::from_str(raw)
        .context("to-state must be a JSON object mapping workflow names to state names")
}
