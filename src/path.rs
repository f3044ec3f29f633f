//! The path micro-language.
//!
//! A path expression is a list of `/`-separated segments, each made of `.`-separated
//! sub-segments. A sub-segment starting with `$` is a macro token:
//!
//! - `$url` expands to `<url>/<suffix>` of the [`MacroContext`],
//! - `$suf` expands to `<suffix>`,
//! - any other token is looked up as a top-level property (sigil included) of the value
//!   being addressed.
//!
//! Resolution never fails. Unknown tokens expand to an empty string.
//!
//! Only the first `/` segment of a resolved path is used as a deep key chain, see
//! [`deep_keys`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Value;

#[cfg(test)]
mod tests;

pub const SIGIL: char = '$';
pub const INDEX_TOKEN: &str = "$url";
pub const SUFFIX_TOKEN: &str = "$suf";

/// The `url` / `suffix` pair macro tokens are expanded against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroContext {
    pub url: String,
    pub suffix: String,
}
impl MacroContext {
    pub fn new(url: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            suffix: suffix.into(),
        }
    }

    /// `<url>/<suffix>`, the expansion of `$url`.
    pub fn index(&self) -> String {
        format!("{}/{}", self.url, self.suffix)
    }
}
impl Default for MacroContext {
    fn default() -> Self {
        Self::new("default", "default")
    }
}

/// Expands every macro token in `expr`, keeping the segment layout.
pub fn resolve(expr: &str, cx: &MacroContext, value: &Value) -> String {
    if expr.is_empty() {
        return String::new();
    }
    expr.split('/')
        .map(|segment| {
            segment
                .split('.')
                .map(|token| expand(token, cx, value))
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn expand<'a>(token: &'a str, cx: &MacroContext, value: &Value) -> Cow<'a, str> {
    if !token.starts_with(SIGIL) {
        return Cow::Borrowed(token);
    }
    match token {
        INDEX_TOKEN => Cow::Owned(cx.index()),
        SUFFIX_TOKEN => Cow::Owned(cx.suffix.clone()),
        _ => Cow::Owned(value.child(token).map(path_text).unwrap_or_default()),
    }
}

/// Text a value contributes when spliced into a path. Null and containers contribute nothing.
pub fn path_text(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string(),
        Value::Null | Value::List(_) | Value::Map(_) => String::new(),
    }
}

/// Key chain used for deep get/set: the first `/` segment of `resolved`, split on `.` and on
/// bracket accessors (`a.b[0]["c"]` → `a`, `b`, `0`, `c`).
///
/// Any further `/` segments are ignored. An empty first segment is the empty key.
pub fn deep_keys(resolved: &str) -> Vec<String> {
    let head = resolved.split('/').next().unwrap_or_default();
    if head.is_empty() {
        return vec![String::new()];
    }
    let mut keys = Vec::new();
    for part in head.split('.') {
        push_part(part, &mut keys);
    }
    keys
}

fn push_part(part: &str, keys: &mut Vec<String>) {
    let (name, mut rest) = match part.find('[') {
        Some(i) => part.split_at(i),
        None => (part, ""),
    };
    if !name.is_empty() || rest.is_empty() {
        keys.push(name.to_owned());
    }
    while !rest.is_empty() {
        match rest.strip_prefix('[').and_then(|body| body.split_once(']')) {
            Some((key, tail)) => {
                keys.push(unquote(key).to_owned());
                rest = tail;
            }
            None => {
                keys.push(rest.to_owned());
                break;
            }
        }
    }
}

fn unquote(key: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = key.strip_prefix(q).and_then(|k| k.strip_suffix(q)) {
            return inner;
        }
    }
    key
}

/// Last component of a path, after the last `.` or `/`.
pub fn pop(path: &str) -> &str {
    match path.rfind(|c| c == '.' || c == '/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// `base.key`, or just `key` when `base` is empty.
pub fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_owned()
    } else {
        format!("{base}.{key}")
    }
}
