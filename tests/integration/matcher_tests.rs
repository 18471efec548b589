//! Rule matching against inbound events.

use reaction_issues::config::GlobalConfig;
use reaction_issues::models::event::ReactionEvent;
use serde_json::json;

use super::test_helpers::{reaction_event, FakeChat, FakeTracker, Harness, GENERAL, MESSAGE_TS, RANDOM};

fn parse(raw: &serde_json::Value) -> Option<ReactionEvent> {
    ReactionEvent::from_value(raw)
}

#[tokio::test]
async fn absent_event_matches_nothing_without_lookups() {
    let harness = Harness::new();

    let rule = harness.middleware.find_matching_rule(None).await.unwrap();

    assert!(rule.is_none());
    assert!(harness.chat.calls().is_empty());
}

#[tokio::test]
async fn non_reaction_event_matches_nothing_without_lookups() {
    let harness = Harness::new();
    let mut raw = reaction_event("evergreen_tree", GENERAL, MESSAGE_TS);
    raw["type"] = json!("reaction_removed");

    let rule = harness
        .middleware
        .find_matching_rule(parse(&raw).as_ref())
        .await
        .unwrap();

    assert!(rule.is_none());
    assert!(harness.chat.calls().is_empty());
}

#[tokio::test]
async fn non_message_item_matches_nothing_without_lookups() {
    let harness = Harness::new();
    let mut raw = reaction_event("evergreen_tree", GENERAL, MESSAGE_TS);
    raw["item"]["type"] = json!("file");

    let rule = harness
        .middleware
        .find_matching_rule(parse(&raw).as_ref())
        .await
        .unwrap();

    assert!(rule.is_none());
    assert!(harness.chat.calls().is_empty());
}

#[tokio::test]
async fn unknown_reaction_resolves_channel_once_and_matches_nothing() {
    let harness = Harness::new();
    let raw = reaction_event("smiley", GENERAL, MESSAGE_TS);

    let rule = harness
        .middleware
        .find_matching_rule(parse(&raw).as_ref())
        .await
        .unwrap();

    assert!(rule.is_none());
    assert_eq!(harness.chat.calls(), vec![format!("channel_name:{GENERAL}")]);
}

#[tokio::test]
async fn channel_scoped_rule_wins_in_its_channel() {
    let harness = Harness::new();
    let raw = reaction_event("evergreen_tree", GENERAL, MESSAGE_TS);

    let rule = harness
        .middleware
        .find_matching_rule(parse(&raw).as_ref())
        .await
        .unwrap()
        .expect("rule matches");

    assert_eq!(rule.github_repository, "org/general-handbook");
    assert_eq!(rule.channel_name.as_deref(), Some("general"));
}

#[tokio::test]
async fn catch_all_rule_matches_other_channels() {
    let harness = Harness::new();
    let raw = reaction_event("evergreen_tree", RANDOM, MESSAGE_TS);

    let rule = harness
        .middleware
        .find_matching_rule(parse(&raw).as_ref())
        .await
        .unwrap()
        .expect("rule matches");

    assert_eq!(rule.github_repository, "org/handbook");
    assert!(rule.channel_name.is_none());
}

#[tokio::test]
async fn earlier_rule_takes_precedence() {
    let config = GlobalConfig::from_toml_str(
        r#"
success_reaction = "heavy_check_mark"

[[rules]]
reaction_name = "evergreen_tree"
github_repository = "org/handbook"

[[rules]]
reaction_name = "evergreen_tree"
github_repository = "org/general-handbook"
channel_name = "general"
"#,
    )
    .unwrap();
    let harness = Harness::with_config(config, FakeChat::default(), FakeTracker::default());
    let raw = reaction_event("evergreen_tree", GENERAL, MESSAGE_TS);

    let rule = harness
        .middleware
        .find_matching_rule(parse(&raw).as_ref())
        .await
        .unwrap()
        .expect("rule matches");

    assert_eq!(rule.github_repository, "org/handbook");
}

#[tokio::test]
async fn channel_lookup_failure_propagates() {
    let harness = Harness::new();
    let raw = reaction_event("evergreen_tree", "C_UNKNOWN", MESSAGE_TS);

    let err = harness
        .middleware
        .find_matching_rule(parse(&raw).as_ref())
        .await
        .expect_err("lookup failure surfaces");

    assert_eq!(err.to_string(), "slack: channel_not_found");
}
