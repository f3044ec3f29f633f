use assert_call::{call, CallRecorder};
use pathstore::{Store, Value};
use serde_json::json;

fn text(v: Option<&Value>) -> String {
    v.map_or_else(|| "undefined".into(), |v| v.to_string())
}

#[test]
fn get_after_update_returns_new_value() {
    let store = Store::new(json!({ "a": { "b": 1 }, "c": [1, 2, 3] }));
    for (path, value) in [
        ("a.b", Value::from(5)),
        ("a", Value::from("flat")),
        ("c[1]", Value::from(true)),
        ("c.2", Value::from(json!({ "x": 1 }))),
    ] {
        store.update(value.clone(), path).unwrap();
        assert_eq!(store.get(path), Some(value));
    }
}

#[test]
fn previous_snapshot_is_never_mutated() {
    let store = Store::new(json!({ "profile": { "name": "x" }, "n": 1 }));
    let before = store.current();
    let copy = before.to_json();

    store.update("y", "profile.name").unwrap();
    store.update(2, "n").unwrap();
    store.update_advanced(json!({}), "").unwrap();

    assert_eq!(before.to_json(), copy);
    assert!(!store.current().same(&before));
}

#[test]
fn repeated_update_is_idempotent() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "a": 0 }));
    let _s = store.subscribe(|v| call!("{}", text(v)), "a");
    cr.verify("0");

    store.update(1, "a").unwrap();
    cr.verify("1");
    let after_first = store.current();

    store.update(1, "a").unwrap();
    cr.verify(());
    assert!(store.current().same(&after_first));
}

#[test]
fn disjoint_subscribers_are_notified_selectively() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "a": { "v": 1 }, "b": { "v": 1 } }));
    let _sa = store.subscribe(|v| call!("a {}", text(v)), "a");
    let _sb = store.subscribe(|v| call!("b {}", text(v)), "b");
    cr.verify(["a {\"v\":1}", "b {\"v\":1}"]);

    store.update(2, "a.v").unwrap();
    cr.verify("a {\"v\":2}");

    store.update(3, "b.v").unwrap();
    cr.verify("b {\"v\":3}");
}

#[test]
fn subscribe_delivers_current_value_synchronously() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "p": "now" }));
    let _s = store.subscribe(|v| call!("{}", text(v)), "p");
    cr.verify("\"now\"");
}

#[test]
fn macro_tokens_resolve_against_context() {
    let store = Store::builder(json!({})).context("room/5", "chat").build();
    assert_eq!(store.resolve("$url"), "room/5/chat");
    assert_eq!(store.resolve("$suf"), "chat");
    assert_eq!(store.index(), "room/5/chat");
}

#[test]
fn whole_value_replace_reevaluates_every_subscriber() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "a": 0, "b": 0 }));
    let _sa = store.subscribe(|v| call!("a {}", text(v)), "a");
    let _sb = store.subscribe(|v| call!("b {}", text(v)), "b");
    let _sall = store.subscribe(|v| call!("all {}", text(v)), "");
    cr.verify(["a 0", "b 0", "all {\"a\":0,\"b\":0}"]);

    store.update_advanced(json!({ "a": 1, "b": 2 }), "").unwrap();
    cr.verify(["a 1", "b 2", "all {\"a\":1,\"b\":2}"]);
    assert_eq!(store.current().to_json(), json!({ "a": 1, "b": 2 }));
}

#[test]
fn deep_set_notifies_leaf_and_ancestor() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "profile": { "name": "x" }, "other": { "k": 1 } }));
    let old_profile = store.get("profile").unwrap();
    let old_other = store.get("other").unwrap();

    let _leaf = store.subscribe(|v| call!("leaf {}", text(v)), "profile.name");
    let _parent = store.subscribe(|v| call!("parent {}", text(v)), "profile");
    let _other = store.subscribe(|v| call!("other {}", text(v)), "other");
    cr.verify([
        "leaf \"x\"",
        "parent {\"name\":\"x\"}",
        "other {\"k\":1}",
    ]);

    store.update("y", "profile.name").unwrap();
    cr.verify(["leaf \"y\"", "parent {\"name\":\"y\"}"]);

    assert_eq!(
        store.current().to_json(),
        json!({ "profile": { "name": "y" }, "other": { "k": 1 } })
    );
    assert!(!store.get("profile").unwrap().same(&old_profile));
    assert!(store.get("other").unwrap().same(&old_other));
}

#[test]
fn structurally_equal_object_counts_as_change() {
    let mut cr = CallRecorder::new();
    let store = Store::new(json!({ "o": { "x": 1 } }));
    let _s = store.subscribe(|v| call!("{}", text(v)), "o");
    cr.verify("{\"x\":1}");

    store.update(json!({ "x": 1 }), "o").unwrap();
    cr.verify("{\"x\":1}");
}
