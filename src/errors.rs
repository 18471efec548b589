//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering collaborator and startup failures.
///
/// Pipeline outcomes have their own taxonomy in
/// [`PipelineError`](crate::pipeline::PipelineError); an `AppError` is what a
/// collaborator hands back and what the pipeline wraps with stage context.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Slack API or Socket Mode failure.
    Slack(String),
    /// GitHub API failure.
    GitHub(String),
    /// Requested entity does not exist.
    NotFound(String),
}

impl AppError {
    /// Detail text without the category prefix.
    ///
    /// Used where the category is already implied by surrounding context,
    /// e.g. "failed to get reactions for <url>: <detail>".
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Config(msg)
            | Self::Slack(msg)
            | Self::GitHub(msg)
            | Self::NotFound(msg) => msg,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::GitHub(msg) => write!(f, "github: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
