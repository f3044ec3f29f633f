use rstest::rstest;
use serde_json::json;

use super::*;

fn cx() -> MacroContext {
    MacroContext::new("room/5", "chat")
}

#[rstest]
#[case("", "")]
#[case("a", "a")]
#[case("a.b.c", "a.b.c")]
#[case("$url", "room/5/chat")]
#[case("$suf", "chat")]
#[case("messages.$suf", "messages.chat")]
#[case("$url.title", "room/5/chat.title")]
#[case("a/$suf/b", "a/chat/b")]
#[case("$name", "alice")]
#[case("$count.x", "3.x")]
#[case("$flag", "true")]
#[case("$missing", "")]
#[case("$nested", "")]
#[case("a..b", "a..b")]
fn resolve_cases(#[case] expr: &str, #[case] expected: &str) {
    let value = Value::from(json!({
        "$name": "alice",
        "$count": 3,
        "$flag": true,
        "$nested": { "x": 1 },
        "name": "not a macro"
    }));
    assert_eq!(resolve(expr, &cx(), &value), expected);
}

#[test]
fn resolve_against_list_value_is_empty() {
    let value = Value::from(json!([1, 2]));
    assert_eq!(resolve("$0.a", &cx(), &value), ".a");
}

#[test]
fn default_context() {
    let cx = MacroContext::default();
    assert_eq!(cx.index(), "default/default");
}

#[rstest]
#[case("", &[""])]
#[case("a", &["a"])]
#[case("a.b", &["a", "b"])]
#[case("a.b/c.d", &["a", "b"])]
#[case("/a", &[""])]
#[case("room/5/chat", &["room"])]
#[case("a[0].b", &["a", "0", "b"])]
#[case("a[\"k\"]", &["a", "k"])]
#[case("a['k'][2]", &["a", "k", "2"])]
#[case("a..b", &["a", "", "b"])]
#[case(".a", &["", "a"])]
#[case("a[", &["a", "["])]
#[case("a[0]b", &["a", "0", "b"])]
fn deep_keys_cases(#[case] resolved: &str, #[case] expected: &[&str]) {
    assert_eq!(deep_keys(resolved), expected);
}

#[rstest]
#[case("a.b.c", "c")]
#[case("a/b.c", "c")]
#[case("a.b/c", "c")]
#[case("abc", "abc")]
#[case("a.", "")]
fn pop_cases(#[case] path: &str, #[case] expected: &str) {
    assert_eq!(pop(path), expected);
}

#[test]
fn join_paths() {
    assert_eq!(join("", "name"), "name");
    assert_eq!(join("profile", "name"), "profile.name");
}
