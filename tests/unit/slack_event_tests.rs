//! Conversion of Socket Mode push events into pipeline input and reply targets.

use reaction_issues::models::event::ReactionEvent;
use reaction_issues::slack::events::{reaction_payload, ReplyTarget};
use serde_json::json;
use slack_morphism::prelude::{SlackChannelId, SlackEventCallbackBody, SlackTs};

fn wire_event() -> serde_json::Value {
    json!({
        "type": "reaction_added",
        "user": "U024BE7LH",
        "reaction": "thumbsup",
        "item_user": "U0G9QF9C6",
        "item": {
            "type": "message",
            "channel": "C0G9QF9GZ",
            "ts": "1360782400.498405"
        },
        "event_ts": "1360782804.083113"
    })
}

fn callback_body(value: serde_json::Value) -> SlackEventCallbackBody {
    serde_json::from_value(value).expect("slack event body deserializes")
}

#[test]
fn reaction_added_body_converts_to_pipeline_event() {
    let raw = reaction_payload(&callback_body(wire_event()))
        .expect("serializes")
        .expect("reaction_added is forwarded");

    let event = ReactionEvent::from_value(&raw).expect("pipeline parses event");
    assert_eq!(event.kind, "reaction_added");
    assert_eq!(event.reaction, "thumbsup");
    assert_eq!(event.user, "U024BE7LH");
    assert_eq!(event.item.kind, "message");
    assert!(event.is_message_reaction());
    assert_eq!(event.message_id(), "C0G9QF9GZ:1360782400.498405");
}

#[test]
fn other_event_types_are_not_forwarded() {
    let body = callback_body(json!({
        "type": "message",
        "channel": "C0G9QF9GZ",
        "user": "U024BE7LH",
        "text": "hello",
        "ts": "1360782400.498405"
    }));

    assert!(reaction_payload(&body).expect("no serialization").is_none());
}

#[test]
fn reply_target_is_reacted_message_thread() {
    let target = ReplyTarget::from_event(&wire_event()).expect("target resolved");

    assert_eq!(target.channel, SlackChannelId("C0G9QF9GZ".into()));
    assert_eq!(target.thread_ts, SlackTs("1360782400.498405".into()));
    assert_eq!(target.user.as_deref(), Some("U024BE7LH"));

    let message = target.message("created: https://github.com/org/repo/issues/1");
    assert_eq!(message.channel, target.channel);
    assert_eq!(message.thread_ts, Some(target.thread_ts.clone()));
    assert_eq!(
        message.text,
        "<@U024BE7LH> created: https://github.com/org/repo/issues/1"
    );
}

#[test]
fn reply_without_user_is_not_prefixed() {
    let mut raw = wire_event();
    raw["user"] = json!("");

    let target = ReplyTarget::from_event(&raw).expect("target resolved");
    assert_eq!(target.user, None);
    assert_eq!(target.message("failed").text, "failed");
}

#[test]
fn events_without_a_message_have_no_reply_target() {
    let mut file_reaction = wire_event();
    file_reaction["item"] = json!({ "type": "file", "file": "F0HS27V1Z" });
    assert_eq!(ReplyTarget::from_event(&file_reaction), None);

    let mut blank_channel = wire_event();
    blank_channel["item"]["channel"] = json!("");
    assert_eq!(ReplyTarget::from_event(&blank_channel), None);

    assert_eq!(ReplyTarget::from_event(&json!({ "type": "team_join" })), None);
    assert_eq!(ReplyTarget::from_event(&json!(null)), None);
}
