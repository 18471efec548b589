//! Per-run request metadata and reaction snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a generated issue title.
const MAX_TITLE_CHARS: usize = 80;

/// Everything the pipeline needs to know about the reacted-to message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Channel identifier as delivered in the event.
    pub channel_id: String,
    /// Resolved human-readable channel name.
    pub channel: String,
    /// Message timestamp (`1360782804.083113`).
    pub timestamp: String,
    /// Permalink to the message.
    pub permalink: String,
    /// Dedup key for the message.
    pub message_id: String,
    /// User who added the reaction.
    pub user: String,
    /// Reaction that triggered the run.
    pub reaction: String,
    /// Message time decoded from `timestamp`, if it parses.
    pub date: Option<DateTime<Utc>>,
}

impl RequestMetadata {
    /// Issue title derived from the message text.
    ///
    /// Uses the first non-empty line, truncated; falls back to a channel and
    /// date based title for messages without text.
    #[must_use]
    pub fn issue_title(&self, message_text: &str) -> String {
        match message_text.lines().map(str::trim).find(|line| !line.is_empty()) {
            Some(line) if line.chars().count() > MAX_TITLE_CHARS => {
                let truncated: String = line.chars().take(MAX_TITLE_CHARS - 1).collect();
                format!("{truncated}\u{2026}")
            }
            Some(line) => line.to_owned(),
            None => match self.date {
                Some(date) => format!(
                    "Update from #{} at {}",
                    self.channel,
                    date.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => format!("Update from #{}", self.channel),
            },
        }
    }

    /// Issue body quoting the message and linking back to it.
    #[must_use]
    pub fn issue_body(&self, message_text: &str) -> String {
        let quoted: Vec<String> = message_text
            .lines()
            .map(|line| format!("> {line}"))
            .collect();
        let mut body = String::new();
        if !quoted.is_empty() {
            body.push_str(&quoted.join("\n"));
            body.push_str("\n\n");
        }
        body.push_str(&format!(
            "Reported from #{} by {} with :{}:\n{}",
            self.channel, self.user, self.reaction, self.permalink
        ));
        body
    }
}

/// Decode a Slack message timestamp (`seconds.micros`) into a UTC instant.
#[must_use]
pub fn parse_slack_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, micros) = ts.split_once('.').unwrap_or((ts, "0"));
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = micros.parse().ok()?;
    DateTime::from_timestamp(secs, micros.checked_mul(1_000)?)
}

/// One emoji on a message with the users who added it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessageReaction {
    /// Emoji name without colons.
    pub name: String,
    /// Number of users who reacted.
    #[serde(default)]
    pub count: u64,
    /// Users who reacted.
    #[serde(default)]
    pub users: Vec<String>,
}

/// Current state of a message as returned by the chat client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessageSnapshot {
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Reactions currently on the message.
    #[serde(default)]
    pub reactions: Vec<MessageReaction>,
}

impl MessageSnapshot {
    /// Whether the named reaction is currently on the message.
    #[must_use]
    pub fn has_reaction(&self, name: &str) -> bool {
        self.reactions.iter().any(|reaction| reaction.name == name)
    }
}
