use assert_call::{call, CallRecorder};
use serde_json::json;

use super::*;

#[test]
fn notifications_coalesce_into_one_flush() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "a": 1, "b": 2 }));
    let mut group = SubscriptionGroup::new();
    group.subscribe(&store, "a", |_| {});
    group.subscribe(&store, "b", |_| {});
    assert!(group.flush(|| call!("render")));
    cr.verify("render");

    store.update(10, "a").unwrap();
    store.update(20, "b").unwrap();
    store.update(30, "a").unwrap();
    assert!(group.is_pending());
    group.flush(|| call!("render"));
    cr.verify("render");

    assert!(!group.flush(|| call!("render")));
    cr.verify(());
}

#[test]
fn unrelated_update_does_not_mark_pending() {
    let store = Store::new(json!({ "a": 1, "b": 2 }));
    let mut group = SubscriptionGroup::new();
    group.subscribe(&store, "a", |_| {});
    group.take_pending();

    store.update(5, "b").unwrap();
    assert!(!group.is_pending());
}

#[test]
fn unsubscribe_all_detaches() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "a": 1 }));
    let mut group = SubscriptionGroup::new();
    group.subscribe(&store, "a", |v| call!("{}", v.map(Value::to_string).unwrap_or_default()));
    cr.verify("1");
    assert_eq!(group.len(), 1);
    assert_eq!(store.subscriber_count(), 1);

    group.unsubscribe_all();
    assert!(group.is_empty());
    assert_eq!(store.subscriber_count(), 0);

    store.update(2, "a").unwrap();
    cr.verify(());
    assert!(!group.is_pending());
}
