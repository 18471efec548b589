//! Slack Socket Mode client with a small buffered reply queue.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiConversationsInfoRequest, SlackApiReactionsAddRequest,
    SlackApiToken, SlackApiTokenType, SlackApiTokenValue, SlackChannelId, SlackClient,
    SlackClientEventsListenerEnvironment, SlackClientHyperHttpsConnector, SlackClientSession,
    SlackClientSocketModeConfig, SlackClientSocketModeListener, SlackMessageContent,
    SlackReactionName, SlackSocketModeListenerCallbacks, SlackTs,
};
use tokio::sync::{mpsc, OnceCell};
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::models::metadata::MessageSnapshot;
use crate::pipeline::{BoxFuture, ChatClient, MessageRef};
use crate::slack::events::{self, AppState};
use crate::{config::SlackConfig, AppError, Result};

const QUEUE_CAPACITY: usize = 256;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const MAX_SEND_ATTEMPTS: u32 = 5;
const WEB_API_BASE: &str = "https://slack.com/api/";

/// Message to be delivered to Slack via chat.postMessage.
#[derive(Debug, Clone)]
pub struct SlackMessage {
    /// Destination channel.
    pub channel: SlackChannelId,
    /// Message text (mrkdwn).
    pub text: String,
    /// Thread root to reply under, if any.
    pub thread_ts: Option<SlackTs>,
}

impl SlackMessage {
    /// Create a plain-text message for a channel.
    pub fn plain(channel: SlackChannelId, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
            thread_ts: None,
        }
    }

    /// Post the message as a reply in the thread rooted at `ts`.
    #[must_use]
    pub fn in_thread(mut self, ts: SlackTs) -> Self {
        self.thread_ts = Some(ts);
        self
    }

    fn into_request(self) -> SlackApiChatPostMessageRequest {
        let content = SlackMessageContent {
            text: Some(self.text),
            blocks: None,
            attachments: None,
            upload: None,
            files: None,
            reactions: None,
            metadata: None,
            markdown_text: None,
        };

        SlackApiChatPostMessageRequest {
            channel: self.channel,
            content,
            as_user: None,
            icon_emoji: None,
            icon_url: None,
            link_names: Some(true),
            parse: None,
            thread_ts: self.thread_ts,
            username: None,
            reply_broadcast: None,
            unfurl_links: None,
            unfurl_media: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TeamInfoResponse {
    team: TeamInfo,
}

#[derive(Debug, Deserialize)]
struct TeamInfo {
    domain: String,
}

#[derive(Debug, Deserialize)]
struct ReactionsGetResponse {
    message: MessageSnapshot,
}

/// Slack Web API and Socket Mode wrapper that owns the outgoing reply queue.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
    app_token: SlackApiToken,
    http: reqwest::Client,
    queue_tx: mpsc::Sender<SlackMessage>,
    team_domain: OnceCell<String>,
}

impl SlackService {
    /// Create the Slack client and start the background sender task.
    ///
    /// The sender exits once `ct` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn start(config: &SlackConfig, ct: CancellationToken) -> Result<(Self, JoinHandle<()>)> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = token(&config.bot_token, SlackApiTokenType::Bot);
        let app_token = token(&config.app_token, SlackApiTokenType::App);

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue_task = Self::spawn_worker(client.clone(), bot_token.clone(), queue_rx, ct);

        info!("slack service started with buffered reply queue");

        Ok((
            Self {
                client,
                bot_token,
                app_token,
                http: reqwest::Client::new(),
                queue_tx,
                team_domain: OnceCell::new(),
            },
            queue_task,
        ))
    }

    /// Enqueue a message for async delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the sender task has stopped.
    pub async fn enqueue(&self, message: SlackMessage) -> Result<()> {
        self.queue_tx
            .send(message)
            .await
            .map_err(|err| AppError::Slack(format!("failed to enqueue slack message: {err}")))
    }

    fn spawn_worker(
        client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        token: SlackApiToken,
        mut queue_rx: mpsc::Receiver<SlackMessage>,
        ct: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let session = client.open_session(&token);
            loop {
                let message = tokio::select! {
                    () = ct.cancelled() => break,
                    message = queue_rx.recv() => match message {
                        Some(message) => message,
                        None => break,
                    },
                };
                let request = message.into_request();
                let mut backoff = INITIAL_RETRY_DELAY;
                for attempt in 1..=MAX_SEND_ATTEMPTS {
                    match session.chat_post_message(&request).await {
                        Ok(_) => {
                            debug!("sent slack message");
                            break;
                        }
                        Err(error) if attempt == MAX_SEND_ATTEMPTS => {
                            error!(?error, attempt, "slack post failed; dropping message");
                        }
                        Err(error) => {
                            let delay = match &error {
                                slack_morphism::errors::SlackClientError::RateLimitError(rate) => {
                                    rate.retry_after.unwrap_or(backoff)
                                }
                                _ => backoff,
                            };
                            warn!(?error, delay=?delay, attempt, "slack post failed; retrying");
                            sleep(delay).await;
                            backoff = (backoff * 2).min(MAX_RETRY_DELAY);
                        }
                    }
                }
            }
            info!("slack sender task exiting");
        })
    }

    /// Connect Socket Mode and route push events to the pipeline.
    #[must_use]
    pub fn spawn_socket_mode(&self, state: Arc<AppState>) -> JoinHandle<()> {
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&self.client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(state),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        let app_token = self.app_token.clone();
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.serve().await;
            info!("socket mode listener exited");
        })
    }

    /// Create an HTTP session for direct API calls using the bot token.
    #[must_use]
    pub fn http_session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }

    /// Call a read-only Web API method whose typed response is not modelled
    /// by the Slack client library in the shape we need.
    async fn web_api_get<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = reqwest::Url::parse_with_params(&format!("{WEB_API_BASE}{method}"), params)
            .map_err(|err| AppError::Slack(format!("invalid {method} url: {err}")))?;
        let body: Value = self
            .http
            .get(url)
            .bearer_auth(&self.bot_token.token_value.0)
            .send()
            .await
            .map_err(|err| AppError::Slack(format!("{method} request failed: {err}")))?
            .json()
            .await
            .map_err(|err| AppError::Slack(format!("{method} returned invalid json: {err}")))?;

        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let reason = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            return Err(AppError::Slack(format!("{method} failed: {reason}")));
        }

        serde_json::from_value(body)
            .map_err(|err| AppError::Slack(format!("unexpected {method} response: {err}")))
    }
}

impl ChatClient for SlackService {
    fn channel_name<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let request = SlackApiConversationsInfoRequest::new(SlackChannelId(channel_id.into()));
            let response = self
                .http_session()
                .conversations_info(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to look up channel: {err}")))?;
            response
                .channel
                .name
                .ok_or_else(|| AppError::NotFound(format!("channel {channel_id} has no name")))
        })
    }

    fn team_domain(&self) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            self.team_domain
                .get_or_try_init(|| async {
                    let response: TeamInfoResponse = self.web_api_get("team.info", &[]).await?;
                    Ok::<_, AppError>(response.team.domain)
                })
                .await
                .cloned()
        })
    }

    fn fetch_reactions<'a>(
        &'a self,
        message: &'a MessageRef,
    ) -> BoxFuture<'a, Result<MessageSnapshot>> {
        Box::pin(async move {
            let response: ReactionsGetResponse = self
                .web_api_get(
                    "reactions.get",
                    &[
                        ("channel", message.channel_id.as_str()),
                        ("timestamp", message.timestamp.as_str()),
                        ("full", "true"),
                    ],
                )
                .await?;
            Ok(response.message)
        })
    }

    fn add_reaction<'a>(
        &'a self,
        message: &'a MessageRef,
        reaction_name: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = SlackApiReactionsAddRequest::new(
                SlackChannelId(message.channel_id.clone()),
                SlackReactionName(reaction_name.into()),
                SlackTs(message.timestamp.clone()),
            );
            self.http_session()
                .reactions_add(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to add reaction: {err}")))?;
            Ok(())
        })
    }
}

fn token(value: &str, token_type: SlackApiTokenType) -> SlackApiToken {
    SlackApiToken {
        token_value: SlackApiTokenValue(value.to_owned()),
        cookie: None,
        team_id: None,
        scope: None,
        token_type: Some(token_type),
    }
}
