//! Reaction rule model.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Maps an emoji reaction (optionally scoped to one channel) to the GitHub
/// repository that receives issues for matching messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Rule {
    /// Emoji name without surrounding colons, e.g. `evergreen_tree`.
    pub reaction_name: String,
    /// Target repository in `owner/repo` form.
    pub github_repository: String,
    /// Channel the rule is restricted to; `None` matches every channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
}

impl Rule {
    /// Create a rule that matches in any channel.
    #[must_use]
    pub fn new(reaction_name: impl Into<String>, github_repository: impl Into<String>) -> Self {
        Self {
            reaction_name: reaction_name.into(),
            github_repository: github_repository.into(),
            channel_name: None,
        }
    }

    /// Restrict the rule to a single channel.
    #[must_use]
    pub fn in_channel(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = Some(channel_name.into());
        self
    }

    /// Whether a reaction in the named channel satisfies this rule.
    #[must_use]
    pub fn matches(&self, reaction_name: &str, channel_name: &str) -> bool {
        self.reaction_name == reaction_name
            && self
                .channel_name
                .as_deref()
                .is_none_or(|name| name == channel_name)
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reaction_name: {}, github_repository: {}",
            self.reaction_name, self.github_repository
        )?;
        if let Some(channel) = &self.channel_name {
            write!(f, ", channel_name: {channel}")?;
        }
        Ok(())
    }
}
