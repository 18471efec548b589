//! Inbound reaction event model.
//!
//! Events arrive from the host as raw JSON. Only the `reaction_added` shape
//! is modelled here; anything else fails to parse and is treated as a
//! non-matching event rather than an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type tag for a reaction being added.
pub const REACTION_ADDED: &str = "reaction_added";

/// Item type tag for a reaction attached to a message.
pub const MESSAGE_ITEM: &str = "message";

/// The thing a reaction was attached to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionItem {
    /// Item kind (`message`, `file`, `file_comment`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Channel identifier, present for message items.
    #[serde(default)]
    pub channel: String,
    /// Message timestamp, present for message items.
    #[serde(default)]
    pub ts: String,
}

/// A `reaction_added` event as delivered by the Events API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionEvent {
    /// Event type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// User who added the reaction.
    #[serde(default)]
    pub user: String,
    /// Emoji name without colons.
    pub reaction: String,
    /// Author of the reacted-to item, when Slack supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_user: Option<String>,
    /// Reacted-to item.
    pub item: ReactionItem,
    /// Event timestamp.
    #[serde(default)]
    pub event_ts: String,
}

impl ReactionEvent {
    /// Parse a raw event, returning `None` for any other shape.
    #[must_use]
    pub fn from_value(raw: &Value) -> Option<Self> {
        Self::deserialize(raw).ok()
    }

    /// Whether this is a reaction added to a message.
    #[must_use]
    pub fn is_message_reaction(&self) -> bool {
        self.kind == REACTION_ADDED && self.item.kind == MESSAGE_ITEM
    }

    /// Key identifying the reacted-to message across events.
    #[must_use]
    pub fn message_id(&self) -> String {
        format!("{}:{}", self.item.channel, self.item.ts)
    }
}
