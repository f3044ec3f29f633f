use std::{collections::BTreeMap, fmt, rc::Rc};

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};


/// A dynamically typed document held by a [`Store`](crate::Store).
///
/// Containers are reference counted, so cloning a `Value` is cheap and an update can share
/// every untouched branch with the previous snapshot.
///
/// `PartialEq` compares structure. Use [`same`](Self::same) for the identity comparison that
/// decides whether subscribers are notified.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    List(Rc<Vec<Value>>),
    Map(Rc<BTreeMap<String, Value>>),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Rc::new(items.into_iter().collect()))
    }
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Strict identity: scalars compare by value, lists and maps by allocation.
    ///
    /// Two structurally equal containers built separately are *not* the same.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// [`same`](Self::same) lifted to possibly absent values. Two absent values are the same.
    pub fn same_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(&**entries),
            _ => None,
        }
    }

    /// Looks up one property. Lists accept canonical decimal indexes only.
    pub fn child(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(key),
            Value::List(items) => items.get(parse_index(key)?),
            _ => None,
        }
    }

    /// Follows a key chain. An empty chain addresses `self`.
    pub fn get_in<K: AsRef<str>>(&self, keys: &[K]) -> Option<&Value> {
        keys.iter().try_fold(self, |value, key| value.child(key.as_ref()))
    }

    /// Returns a new value with `new` stored at the end of `keys`.
    ///
    /// Only the containers on the way to the target are copied; every other branch is shared
    /// with `self`, which is left untouched. Missing or null intermediates are created as a
    /// list when the following key is an index and as a map otherwise. Writing past the end of
    /// a list pads it with `Null`, up to [`MAX_LIST_GAP`] items; an index further out is a
    /// [`Error::PathConflict`].
    pub fn set_in<K: AsRef<str>>(&self, keys: &[K], new: Value) -> Result<Value> {
        let Some((key, rest)) = keys.split_first() else {
            return Ok(new);
        };
        let key = key.as_ref();
        let conflict = || Error::PathConflict {
            key: key.to_owned(),
            kind: self.kind(),
        };
        match self {
            Value::Map(entries) => {
                let child = Self::set_child(entries.get(key), rest, new)?;
                let mut entries = BTreeMap::clone(entries);
                entries.insert(key.to_owned(), child);
                Ok(Value::Map(Rc::new(entries)))
            }
            Value::List(items) => {
                let index = parse_index(key)
                    .filter(|index| index.saturating_sub(items.len()) <= MAX_LIST_GAP)
                    .ok_or_else(conflict)?;
                let child = Self::set_child(items.get(index), rest, new)?;
                let mut items = Vec::clone(items);
                if index < items.len() {
                    items[index] = child;
                } else {
                    items.resize(index, Value::Null);
                    items.push(child);
                }
                Ok(Value::List(Rc::new(items)))
            }
            Value::Null => Self::vacant(keys).set_in(keys, new),
            _ => Err(conflict()),
        }
    }
    fn set_child<K: AsRef<str>>(current: Option<&Value>, rest: &[K], new: Value) -> Result<Value> {
        match current {
            Some(current) if !current.is_null() => current.set_in(rest, new),
            _ => Self::vacant(rest).set_in(rest, new),
        }
    }
    fn vacant<K: AsRef<str>>(keys: &[K]) -> Value {
        match keys.first() {
            Some(key) if parse_index(key.as_ref()).is_some() => Value::List(Rc::default()),
            _ => Value::Map(Rc::default()),
        }
    }

    /// Converts any serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Converts into any deserializable type.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.to_string()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// How many `Null` items a list write may insert before the written index.
pub const MAX_LIST_GAP: usize = 1 << 16;

/// Accepts `0` and decimal numbers without leading zeros.
pub(crate) fn parse_index(key: &str) -> Option<usize> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

// Integral numbers are written as integers so that typed conversions into integer fields work.
fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_json(), f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            Json::String(s) => Value::String(s.into()),
            Json::Array(items) => Value::list(items.into_iter().map(Value::from)),
            Json::Object(entries) => Value::map(entries.into_iter().map(|(k, v)| (k, v.into()))),
        }
    }
}
impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        value.clone().into()
    }
}
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}
impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}
impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value.into())
    }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}
impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(Rc::new(value))
    }
}
impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(Rc::new(value))
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => number_to_json(*n).serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items.iter()),
            Value::Map(entries) => serializer.collect_map(entries.iter()),
        }
    }
}
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
