//! Reaction-to-issue pipeline.
//!
//! The capability traits in this module decouple the orchestration core
//! from Slack, GitHub and the log sink. Production wiring supplies
//! [`SlackService`](crate::slack::client::SlackService),
//! [`GitHubClient`](crate::github::client::GitHubClient) and
//! [`TracingLogger`]; tests substitute in-process fakes.

pub mod error;
pub mod logger;
pub mod matcher;
pub mod metadata;
pub mod middleware;
pub mod registry;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::models::metadata::MessageSnapshot;
use crate::Result;

pub use error::PipelineError;
pub use logger::{PipelineLogger, TracingLogger};
pub use middleware::Middleware;

/// Boxed future returned by capability methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reference to a single chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    /// Channel identifier.
    pub channel_id: String,
    /// Message timestamp.
    pub timestamp: String,
}

/// Chat platform operations the pipeline depends on.
pub trait ChatClient: Send + Sync {
    /// Resolve a channel identifier to its name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) if the lookup fails.
    fn channel_name<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, Result<String>>;

    /// Resolve the workspace's team domain (`<domain>.slack.com`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) if the lookup fails.
    fn team_domain(&self) -> BoxFuture<'_, Result<String>>;

    /// Fetch the message text and its current reactions.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) on transport or API error.
    fn fetch_reactions<'a>(&'a self, message: &'a MessageRef)
        -> BoxFuture<'a, Result<MessageSnapshot>>;

    /// Add a reaction to the message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) on transport or API error.
    fn add_reaction<'a>(
        &'a self,
        message: &'a MessageRef,
        reaction_name: &'a str,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Issue tracker operations the pipeline depends on.
pub trait TrackerClient: Send + Sync {
    /// Create an issue and return its URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GitHub`](crate::AppError::GitHub) if the issue cannot be created.
    fn create_issue<'a>(
        &'a self,
        repository: &'a str,
        title: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Host-side view of one inbound event.
pub trait ResponseContext: Send + Sync {
    /// The event exactly as received; `Value::Null` when absent.
    fn raw_event(&self) -> &Value;

    /// Post a reply addressed to the originating message.
    fn reply<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ()>;
}
