//! Global configuration parsing, validation, and credential loading.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::models::rule::Rule;
use crate::{AppError, Result};

/// Keychain service under which credentials are stored.
const KEYRING_SERVICE: &str = "reaction-issues";

static REPOSITORY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").ok());

/// Slack connectivity settings.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SlackConfig {
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for Web API calls (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

/// GitHub API settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct GitHubConfig {
    /// Base URL of the REST API; override for GitHub Enterprise.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Personal access or app token (populated at runtime).
    #[serde(skip)]
    pub token: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            token: String::new(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.github.com".into()
}

fn default_user_agent() -> String {
    concat!("reaction-issues/", env!("CARGO_PKG_VERSION")).into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct GlobalConfig {
    /// Reaction added to a message once its issue has been filed.
    pub success_reaction: String,
    /// Rules in priority order; the first match wins.
    pub rules: Vec<Rule>,
    /// Slack connectivity settings.
    #[serde(default)]
    pub slack: SlackConfig,
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack and GitHub credentials from OS keychain with env-var fallback.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// a required token.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        self.github.token = load_credential("github_token", "GITHUB_TOKEN").await?;
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.success_reaction = trim_colons(&self.success_reaction);
        if self.success_reaction.is_empty() {
            return Err(AppError::Config("success_reaction must not be empty".into()));
        }

        if self.rules.is_empty() {
            return Err(AppError::Config("rules must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for (index, rule) in self.rules.iter_mut().enumerate() {
            validate_rule(index, rule)?;
            if !seen.insert((rule.reaction_name.clone(), rule.channel_name.clone())) {
                return Err(AppError::Config(format!(
                    "rules[{index}] duplicates an earlier rule: {rule}"
                )));
            }
        }

        let base = self.github.api_base_url.trim_end_matches('/').to_owned();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(AppError::Config(format!(
                "github.api_base_url must be an http(s) URL: {base}"
            )));
        }
        self.github.api_base_url = base;

        Ok(())
    }
}

/// Normalize a rule in place and check its fields.
fn validate_rule(index: usize, rule: &mut Rule) -> Result<()> {
    rule.reaction_name = trim_colons(&rule.reaction_name);
    if rule.reaction_name.is_empty() {
        return Err(AppError::Config(format!(
            "rules[{index}].reaction_name must not be empty"
        )));
    }

    let repository = rule.github_repository.trim();
    let valid = REPOSITORY_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(repository));
    if !valid {
        return Err(AppError::Config(format!(
            "rules[{index}].github_repository must be \"owner/repo\": {}",
            rule.github_repository
        )));
    }
    rule.github_repository = repository.to_owned();

    if let Some(channel) = rule.channel_name.as_mut() {
        *channel = channel.trim().trim_start_matches('#').to_owned();
        if channel.is_empty() {
            return Err(AppError::Config(format!(
                "rules[{index}].channel_name must not be empty when present"
            )));
        }
    }

    Ok(())
}

/// Accept `:emoji:` as well as `emoji`.
fn trim_colons(name: &str) -> String {
    name.trim().trim_matches(':').to_owned()
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}
