//! Socket Mode push event dispatch.
//!
//! `reaction_added` events are handed to the pipeline on their own task so
//! a slow Slack or GitHub call for one message never holds up events for
//! other messages. Every other push event is acknowledged and dropped.

use std::sync::Arc;

use serde_json::Value;
use slack_morphism::prelude::{
    SlackChannelId, SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackPushEventCallback, SlackTs,
};
use tracing::{debug, info, warn};

use crate::models::event::ReactionEvent;
use crate::pipeline::{BoxFuture, Middleware, ResponseContext};
use crate::slack::client::{SlackMessage, SlackService};
use crate::{AppError, Result};

/// State shared with Socket Mode callbacks.
pub struct AppState {
    /// Slack client used for replies.
    pub slack: Arc<SlackService>,
    /// Pipeline orchestrator.
    pub middleware: Middleware,
}

/// Where replies for one event go: the reacted-to message's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    /// Channel holding the reacted-to message.
    pub channel: SlackChannelId,
    /// Timestamp of the reacted-to message, used as the thread root.
    pub thread_ts: SlackTs,
    /// Reacting user, mentioned at the start of each reply.
    pub user: Option<String>,
}

impl ReplyTarget {
    /// Derive the reply target from a raw event.
    ///
    /// Returns `None` when the event does not identify a message.
    #[must_use]
    pub fn from_event(raw: &Value) -> Option<Self> {
        let event = ReactionEvent::from_value(raw)?;
        if event.item.channel.is_empty() || event.item.ts.is_empty() {
            return None;
        }
        Some(Self {
            channel: SlackChannelId(event.item.channel),
            thread_ts: SlackTs(event.item.ts),
            user: Some(event.user).filter(|user| !user.is_empty()),
        })
    }

    /// Threaded reply carrying `text`.
    #[must_use]
    pub fn message(&self, text: &str) -> SlackMessage {
        let text = match &self.user {
            Some(user) => format!("<@{user}> {text}"),
            None => text.to_owned(),
        };
        SlackMessage::plain(self.channel.clone(), text).in_thread(self.thread_ts.clone())
    }
}

/// Reply context for one inbound event.
pub struct SlackReply {
    slack: Arc<SlackService>,
    raw: Value,
    target: Option<ReplyTarget>,
}

impl SlackReply {
    /// Build a reply context for a raw event.
    #[must_use]
    pub fn new(slack: Arc<SlackService>, raw: Value) -> Self {
        let target = ReplyTarget::from_event(&raw);
        Self { slack, raw, target }
    }
}

impl ResponseContext for SlackReply {
    fn raw_event(&self) -> &Value {
        &self.raw
    }

    fn reply<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some(target) = &self.target else {
                warn!(text, "no reply target for event; reply dropped");
                return;
            };
            if let Err(err) = self.slack.enqueue(target.message(text)).await {
                warn!(%err, "failed to enqueue reply");
            }
        })
    }
}

/// Raw JSON for a `reaction_added` push event body.
///
/// Returns `Ok(None)` for every other event type.
///
/// # Errors
///
/// Returns `AppError::Slack` if the event cannot be serialized.
pub fn reaction_payload(body: &SlackEventCallbackBody) -> Result<Option<Value>> {
    if !matches!(body, SlackEventCallbackBody::ReactionAdded(_)) {
        return Ok(None);
    }
    serde_json::to_value(body)
        .map(Some)
        .map_err(|err| AppError::Slack(format!("failed to serialize reaction event: {err}")))
}

/// Handle push events delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; pipeline outcomes are reported through replies and logs.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let raw = match reaction_payload(&event.event) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("push event ignored");
            return Ok(());
        }
        Err(err) => {
            warn!(%err, "dropping reaction event");
            return Ok(());
        }
    };

    let app_state: Option<Arc<AppState>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<AppState>>().cloned()
    };
    let Some(app) = app_state else {
        warn!("app state not available; cannot process reaction");
        return Ok(());
    };

    let event_id = event.event_id.0.clone();
    tokio::spawn(async move {
        let reply = SlackReply::new(Arc::clone(&app.slack), raw);
        let done = move || debug!(%event_id, "reaction event handled");
        match app.middleware.execute(&reply, |done| done(), done).await {
            Ok(issue_url) => info!(%issue_url, "reaction processed"),
            Err(err) if err.is_expected() => debug!(%err, "reaction skipped"),
            Err(err) => debug!(%err, "reaction failed"),
        }
    });

    Ok(())
}
