//! Request metadata extraction.

use crate::models::event::ReactionEvent;
use crate::models::metadata::{parse_slack_ts, RequestMetadata};
use crate::pipeline::ChatClient;
use crate::Result;

/// Build the metadata record for a matched event.
///
/// The event must already have passed the matcher's structural checks.
///
/// # Errors
///
/// Returns the chat client's error if the channel name or team domain
/// cannot be resolved.
pub async fn parse_metadata(chat: &dyn ChatClient, event: &ReactionEvent) -> Result<RequestMetadata> {
    let channel = chat.channel_name(&event.item.channel).await?;
    let domain = chat.team_domain().await?;
    let timestamp = event.item.ts.clone();

    Ok(RequestMetadata {
        channel_id: event.item.channel.clone(),
        permalink: permalink(&domain, &channel, &timestamp),
        message_id: event.message_id(),
        user: event.user.clone(),
        reaction: event.reaction.clone(),
        date: parse_slack_ts(&timestamp),
        channel,
        timestamp,
    })
}

/// Slack archive URL for a message.
#[must_use]
pub fn permalink(team_domain: &str, channel_name: &str, timestamp: &str) -> String {
    format!(
        "https://{team_domain}.slack.com/archives/{channel_name}/p{}",
        timestamp.replace('.', "")
    )
}
