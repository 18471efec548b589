//! Reaction pipeline orchestrator.
//!
//! [`Middleware::execute`] runs one inbound event through
//!
//! 1. rule matching,
//! 2. metadata extraction,
//! 3. claiming the message in the in-flight registry,
//! 4. fetching the message's current reactions,
//! 5. the already-processed check against the success reaction,
//! 6. filing the GitHub issue,
//! 7. adding the success reaction,
//! 8. replying with the issue URL.
//!
//! Each stage finishes before the next begins. At most one run per message
//! is ever between claim and release; a duplicate arriving in that window is
//! rejected with [`PipelineError::InProgress`] without touching Slack or
//! GitHub.

use std::sync::Arc;

use serde_json::Value;

use crate::config::GlobalConfig;
use crate::models::event::ReactionEvent;
use crate::models::metadata::RequestMetadata;
use crate::models::rule::Rule;
use crate::pipeline::registry::InFlightRegistry;
use crate::pipeline::{
    matcher, metadata, ChatClient, MessageRef, PipelineError, PipelineLogger, ResponseContext,
    TrackerClient,
};
use crate::{AppError, Result};

/// Shared orchestrator; one instance serves every event for the process.
pub struct Middleware {
    config: Arc<GlobalConfig>,
    chat: Arc<dyn ChatClient>,
    tracker: Arc<dyn TrackerClient>,
    logger: Arc<dyn PipelineLogger>,
    in_progress: InFlightRegistry,
}

impl Middleware {
    /// Build an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        chat: Arc<dyn ChatClient>,
        tracker: Arc<dyn TrackerClient>,
        logger: Arc<dyn PipelineLogger>,
    ) -> Self {
        Self {
            config,
            chat,
            tracker,
            logger,
            in_progress: InFlightRegistry::new(),
        }
    }

    /// Messages currently being processed.
    #[must_use]
    pub fn in_progress(&self) -> &InFlightRegistry {
        &self.in_progress
    }

    /// First configured rule matching `event`, if any.
    ///
    /// # Errors
    ///
    /// Returns the chat client's error if the channel name cannot be resolved.
    pub async fn find_matching_rule(&self, event: Option<&ReactionEvent>) -> Result<Option<&Rule>> {
        matcher::find_matching_rule(&self.config.rules, self.chat.as_ref(), event).await
    }

    /// Metadata for a matched event.
    ///
    /// # Errors
    ///
    /// Returns the chat client's error if the channel name or team domain
    /// cannot be resolved.
    pub async fn parse_metadata(&self, event: &ReactionEvent) -> Result<RequestMetadata> {
        metadata::parse_metadata(self.chat.as_ref(), event).await
    }

    /// Run the full pipeline for one event.
    ///
    /// `next` receives `done` exactly once after the run has finished and the
    /// message's registry entry has been released, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] describing why no issue URL was produced.
    pub async fn execute<C, N, D>(
        &self,
        context: &C,
        next: N,
        done: D,
    ) -> std::result::Result<String, PipelineError>
    where
        C: ResponseContext + ?Sized,
        N: FnOnce(D),
    {
        let outcome = self.run(context).await;
        next(done);
        outcome
    }

    async fn run<C>(&self, context: &C) -> std::result::Result<String, PipelineError>
    where
        C: ResponseContext + ?Sized,
    {
        let raw = context.raw_event();
        let event = ReactionEvent::from_value(raw);

        let rule = match self.find_matching_rule(event.as_ref()).await {
            Ok(rule) => rule,
            Err(err) => return Err(self.unanticipated(context, &err).await),
        };
        let (Some(event), Some(rule)) = (event.as_ref(), rule) else {
            return Err(PipelineError::Unmatched);
        };

        let message_id = event.message_id();
        self.logger
            .info(Some(message_id.as_str()), &format!("matches rule: {rule}"));

        let metadata = match self.parse_metadata(event).await {
            Ok(metadata) => metadata,
            Err(err) => return Err(self.unanticipated(context, &err).await),
        };

        let Some(_claim) = self.in_progress.try_claim(&metadata.message_id) else {
            self.logger.info(Some(message_id.as_str()), "already in progress");
            return Err(PipelineError::InProgress { message_id });
        };

        match self.file_issue(rule, &metadata).await {
            Ok(issue_url) => {
                let text = format!("created: {issue_url}");
                self.logger.info(Some(message_id.as_str()), &text);
                context.reply(&text).await;
                Ok(issue_url)
            }
            Err(err @ PipelineError::AlreadyProcessed { .. }) => {
                self.logger.info(Some(message_id.as_str()), &err.to_string());
                Err(err)
            }
            Err(err) => {
                let text = err.to_string();
                self.logger.error(Some(message_id.as_str()), &text);
                context.reply(&text).await;
                Err(err)
            }
        }
    }

    /// Stages 4 through 7: reactions, already-processed check, issue, marker.
    async fn file_issue(
        &self,
        rule: &Rule,
        metadata: &RequestMetadata,
    ) -> std::result::Result<String, PipelineError> {
        let id = Some(metadata.message_id.as_str());
        let permalink = &metadata.permalink;
        let success_reaction = &self.config.success_reaction;
        let message = MessageRef {
            channel_id: metadata.channel_id.clone(),
            timestamp: metadata.timestamp.clone(),
        };

        self.logger
            .info(id, &format!("getting reactions for {permalink}"));
        let snapshot = self
            .chat
            .fetch_reactions(&message)
            .await
            .map_err(|err| PipelineError::ReactionFetch {
                permalink: permalink.clone(),
                cause: err.detail().to_owned(),
            })?;

        if snapshot.has_reaction(success_reaction) {
            return Err(PipelineError::AlreadyProcessed {
                permalink: permalink.clone(),
            });
        }

        self.logger
            .info(id, &format!("making GitHub request for {permalink}"));
        let title = metadata.issue_title(&snapshot.text);
        let body = metadata.issue_body(&snapshot.text);
        let issue_url = self
            .tracker
            .create_issue(&rule.github_repository, &title, &body)
            .await
            .map_err(|err| PipelineError::IssueCreation {
                repository: rule.github_repository.clone(),
                cause: err.detail().to_owned(),
            })?;

        self.logger.info(id, &format!("adding {success_reaction}"));
        self.chat
            .add_reaction(&message, success_reaction)
            .await
            .map_err(|err| PipelineError::MarkerApplication {
                issue_url: issue_url.clone(),
                reaction: success_reaction.clone(),
                cause: err.detail().to_owned(),
            })?;

        Ok(issue_url)
    }

    async fn unanticipated<C>(&self, context: &C, err: &AppError) -> PipelineError
    where
        C: ResponseContext + ?Sized,
    {
        let failure = PipelineError::Unanticipated {
            error: err.to_string(),
            event_json: pretty_json(context.raw_event()),
        };
        let text = failure.to_string();
        self.logger.error(None, &text);
        context.reply(&text).await;
        failure
    }
}

fn pretty_json(raw: &Value) -> String {
    serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string())
}
