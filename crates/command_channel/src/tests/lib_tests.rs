use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{json, Value};

use super::*;

fn label(value: Option<&ScrollyCommand>) -> String {
    match value {
        Some(command) => command.kind().unwrap_or("?").to_string(),
        None => "empty".to_string(),
    }
}

fn recorder(
    log: &Arc<Mutex<Vec<String>>>,
    tag: &str,
) -> impl Fn(Option<&ScrollyCommand>) + Send + Sync + 'static {
    let log = Arc::clone(log);
    let tag = tag.to_string();
    move |value| {
        log.lock()
            .expect("log lock")
            .push(format!("{tag}:{}", label(value)));
    }
}

#[test]
fn publish_stamps_payload_with_wall_clock_timestamp() {
    let channel = CommandChannel::new();

    let before = Utc::now().timestamp_millis();
    channel
        .publish(json!({"type": "goto", "target": "chapter-2"}))
        .expect("publish");
    let after = Utc::now().timestamp_millis();

    let command = channel.current().expect("current command");
    assert_eq!(command.kind(), Some("goto"));
    assert_eq!(
        command.field("target").and_then(Value::as_str),
        Some("chapter-2")
    );
    assert!(command.timestamp_ms >= before && command.timestamp_ms <= after);
}

#[test]
fn latest_publish_replaces_current_value() {
    let channel = CommandChannel::new();
    channel.publish(json!({"type": "play"})).expect("play");
    channel.publish(json!({"type": "pause"})).expect("pause");

    let command = channel.current().expect("current command");
    assert_eq!(command.kind(), Some("pause"));
}

#[test]
fn rejects_non_object_payloads() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _sub = channel.subscribe(recorder(&log, "a"));

    for payload in [json!(null), json!(true), json!(7), json!("goto"), json!([1, 2])] {
        let error = channel.publish(payload).expect_err("non-object payload");
        assert!(matches!(error, ChannelError::InvalidArgument(_)));
    }

    assert!(channel.current().is_none());
    assert_eq!(*log.lock().expect("log lock"), vec!["a:empty"]);
}

#[test]
fn subscriber_immediately_receives_current_value() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let _early = channel.subscribe(recorder(&log, "early"));
    channel.publish(json!({"type": "play"})).expect("publish");
    let _late = channel.subscribe(recorder(&log, "late"));

    assert_eq!(
        *log.lock().expect("log lock"),
        vec!["early:empty", "early:play", "late:play"]
    );
}

#[test]
fn notifies_observers_in_subscription_order_exactly_once() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let _a = channel.subscribe(recorder(&log, "a"));
    let _b = channel.subscribe(recorder(&log, "b"));
    let _c = channel.subscribe(recorder(&log, "c"));
    channel.publish(json!({"type": "play"})).expect("publish");

    assert_eq!(
        *log.lock().expect("log lock"),
        vec!["a:empty", "b:empty", "c:empty", "a:play", "b:play", "c:play"]
    );
}

#[test]
fn cancelled_observer_receives_no_further_notifications() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let sub = channel.subscribe(recorder(&log, "a"));
    channel.publish(json!({"type": "play"})).expect("play");
    sub.cancel();
    channel.publish(json!({"type": "pause"})).expect("pause");

    assert_eq!(*log.lock().expect("log lock"), vec!["a:empty", "a:play"]);
    assert_eq!(channel.observer_count(), 0);
}

#[test]
fn overwrites_timestamp_field_supplied_by_publisher() {
    let channel = CommandChannel::new();

    let before = Utc::now().timestamp_millis();
    channel
        .publish(json!({"type": "goto", "timestamp": 12}))
        .expect("publish");

    let command = channel.current().expect("current command");
    assert!(command.timestamp_ms >= before);
    assert!(!command.fields.contains_key(TIMESTAMP_FIELD));
}

#[test]
fn serializes_as_flattened_wire_object() {
    let channel = CommandChannel::new();
    channel
        .publish(json!({"type": "goto", "target": "chapter-2"}))
        .expect("publish");

    let command = channel.current().expect("current command");
    let wire = serde_json::to_value(&command).expect("serialize");
    let object = wire.as_object().expect("wire object");

    assert_eq!(object.len(), 3);
    assert_eq!(object.get("type"), Some(&json!("goto")));
    assert_eq!(object.get("target"), Some(&json!("chapter-2")));
    assert_eq!(
        object.get(TIMESTAMP_FIELD).and_then(Value::as_i64),
        Some(command.timestamp_ms)
    );

    let parsed: ScrollyCommand = serde_json::from_value(wire).expect("deserialize");
    assert_eq!(parsed, command);
}

#[test]
fn cancelling_from_inside_a_callback_spares_unrelated_observers() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let canceller_victim = Arc::clone(&victim);
    let _canceller = channel.subscribe(move |value| {
        if value.is_some() {
            if let Some(sub) = canceller_victim.lock().expect("victim lock").take() {
                sub.cancel();
            }
        }
    });
    let b = channel.subscribe(recorder(&log, "b"));
    let _c = channel.subscribe(recorder(&log, "c"));
    *victim.lock().expect("victim lock") = Some(b);

    channel.publish(json!({"type": "play"})).expect("publish");

    // b was cancelled mid-notification; c must still see the publish.
    assert_eq!(
        *log.lock().expect("log lock"),
        vec!["b:empty", "c:empty", "c:play"]
    );
    assert_eq!(channel.observer_count(), 2);
}

#[test]
fn subscribing_from_inside_a_callback_notifies_the_newcomer_once() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let inner_channel = channel.clone();
    let inner_log = Arc::clone(&log);
    let added = Arc::new(Mutex::new(false));
    let _a = channel.subscribe(move |value| {
        if value.is_some() {
            let mut added = added.lock().expect("added lock");
            if !*added {
                *added = true;
                // Dropping the handle leaves the subscription registered.
                let _ = inner_channel.subscribe(recorder(&inner_log, "d"));
            }
        }
    });

    channel.publish(json!({"type": "play"})).expect("publish");

    assert_eq!(*log.lock().expect("log lock"), vec!["d:play"]);
    assert_eq!(channel.observer_count(), 2);
}

#[test]
fn panicking_observer_does_not_block_later_observers() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let _bad = channel.subscribe(|value| {
        if value.is_some() {
            panic!("observer failure");
        }
    });
    let _good = channel.subscribe(recorder(&log, "good"));

    channel.publish(json!({"type": "play"})).expect("publish");

    assert_eq!(*log.lock().expect("log lock"), vec!["good:empty", "good:play"]);
}

#[test]
fn cloned_handles_share_channel_state() {
    let channel = CommandChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _sub = channel.subscribe(recorder(&log, "a"));

    let other = channel.clone();
    other.publish(json!({"type": "play"})).expect("publish");

    assert_eq!(channel.current().expect("current").kind(), Some("play"));
    assert_eq!(*log.lock().expect("log lock"), vec!["a:empty", "a:play"]);
}

#[test]
fn cancel_after_channel_dropped_is_a_noop() {
    let channel = CommandChannel::new();
    let sub = channel.subscribe(|_| {});
    drop(channel);
    sub.cancel();
}
