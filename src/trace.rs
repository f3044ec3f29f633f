use std::{collections::BTreeSet, fmt};

use parse_display::{Display, FromStr};

use crate::Value;


/// Named events a [`Store`](crate::Store) reports to its [`TraceSink`].
///
/// Field and emitter events are also reported under `"<event> <key>"`, so a debug flag set
/// can select a single field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, FromStr)]
pub enum TraceEvent {
    #[display("pre update")]
    PreUpdate,
    #[display("update")]
    Update,
    #[display("global set")]
    GlobalSet,
    #[display("replace")]
    Replace,
    #[display("global get")]
    GlobalGet,
    #[display("use")]
    Use,
    #[display("emit")]
    Emit,
    #[display("pre set")]
    PreSet,
    #[display("set")]
    Set,
    #[display("get")]
    Get,
}

/// One argument of a trace event.
#[derive(Clone, Copy, Debug)]
pub enum TraceArg<'a> {
    Str(&'a str),
    Value(Option<&'a Value>),
}
impl fmt::Display for TraceArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceArg::Str("") | TraceArg::Value(None) => write!(f, "?"),
            TraceArg::Str(s) => write!(f, "{s}"),
            TraceArg::Value(Some(v)) => write!(f, "{v}"),
        }
    }
}

/// Receives the trace events enabled by a store's [`DebugFlags`].
///
/// Implementations must not call back into the store that emitted the event.
pub trait TraceSink {
    fn trace(&self, store: &str, event: &str, args: &[TraceArg]);
}

/// Forwards trace events to the `log` facade at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn trace(&self, store: &str, event: &str, args: &[TraceArg]) {
        log::debug!(target: "pathstore", "{store} {event} {}", ArgList(args));
    }
}

struct ArgList<'a>(&'a [TraceArg<'a>]);
impl fmt::Display for ArgList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

/// The set of trace event names a store reports.
///
/// Persisted as a comma-joined string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DebugFlags(BTreeSet<String>);

impl DebugFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-joined list. Empty entries are skipped.
    pub fn parse(s: &str) -> Self {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
    pub fn enables(&self, event: TraceEvent) -> bool {
        self.contains(&event.to_string())
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
impl fmt::Display for DebugFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{name}")?;
        }
        Ok(())
    }
}
impl<S: Into<String>> FromIterator<S> for DebugFlags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
impl From<TraceEvent> for DebugFlags {
    fn from(event: TraceEvent) -> Self {
        [event.to_string()].into_iter().collect()
    }
}
