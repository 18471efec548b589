//! GitHub REST client for filing issues.

use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GitHubConfig;
use crate::pipeline::{BoxFuture, TrackerClient};
use crate::{AppError, Result};

const ACCEPT_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Files issues through `POST /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base_url: String,
    user_agent: String,
    token: String,
}

impl GitHubClient {
    /// Build a client from configuration.
    #[must_use]
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            user_agent: config.user_agent.clone(),
            token: config.token.clone(),
        }
    }

    /// Create an issue and return its `html_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::GitHub` on transport failure, a non-success status
    /// (with the API's error message when it provides one), or a response
    /// without an issue URL.
    pub async fn file_issue(&self, repository: &str, title: &str, body: &str) -> Result<String> {
        let url = format!("{}/repos/{repository}/issues", self.api_base_url);
        debug!(%url, "creating github issue");

        let mut request = self
            .http
            .post(&url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, ACCEPT_JSON)
            .json(&NewIssue { title, body });
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AppError::GitHub(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiError>()
                .await
                .map(|error| error.message)
                .unwrap_or_default();
            return Err(AppError::GitHub(if message.is_empty() {
                format!("received {status}")
            } else {
                format!("received {status}: {message}")
            }));
        }

        response
            .json::<CreatedIssue>()
            .await
            .map(|issue| issue.html_url)
            .map_err(|err| AppError::GitHub(format!("unexpected response: {err}")))
    }
}

impl TrackerClient for GitHubClient {
    fn create_issue<'a>(
        &'a self,
        repository: &'a str,
        title: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.file_issue(repository, title, body))
    }
}
