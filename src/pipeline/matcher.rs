//! Rule matching against inbound reaction events.

use crate::models::event::ReactionEvent;
use crate::models::rule::Rule;
use crate::pipeline::ChatClient;
use crate::Result;

/// Find the first rule satisfied by `event`.
///
/// Events that are absent or are not reactions on messages match nothing
/// and cause no lookups. Otherwise the channel name is resolved exactly
/// once, whether or not a rule ends up matching, and `rules` is scanned in
/// order.
///
/// # Errors
///
/// Returns the chat client's error if the channel name cannot be resolved.
pub async fn find_matching_rule<'r>(
    rules: &'r [Rule],
    chat: &dyn ChatClient,
    event: Option<&ReactionEvent>,
) -> Result<Option<&'r Rule>> {
    let Some(event) = event.filter(|event| event.is_message_reaction()) else {
        return Ok(None);
    };

    let channel_name = chat.channel_name(&event.item.channel).await?;
    Ok(rules
        .iter()
        .find(|rule| rule.matches(&event.reaction, &channel_name)))
}
