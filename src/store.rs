use std::{cell::RefCell, marker::PhantomData, mem::replace, rc::Rc};

use derive_ex::derive_ex;
use serde::{de::DeserializeOwned, Serialize};
use slabmap::SlabMap;

use crate::{
    path::{self, MacroContext},
    storage::{DebugStorage, NoopStorage},
    trace::{DebugFlags, LogSink, TraceArg, TraceEvent, TraceSink},
    Result, StoreOptions, Subscription, Value,
};


/// Callback registered with [`Store::subscribe`]. `None` means nothing is stored at the path.
pub type Callback = Rc<dyn Fn(Option<&Value>)>;

/// A path-addressable state container.
///
/// The store holds one immutable snapshot. Every committed update replaces it with a new
/// snapshot that shares all untouched branches with the old one, so anyone holding an old
/// snapshot keeps a stable view.
///
/// Subscribers watch a path and are called only when the value at their path changes by
/// identity (see [`Value::same`]).
///
/// `T` is the static type of the whole snapshot. It only matters for the typed helpers
/// ([`value`](Self::value), [`replace_with`](Self::replace_with)); paths always work on [`Value`].
///
/// Cloning a `Store` yields another handle to the same container.
#[derive_ex(Clone, bound())]
pub struct Store<T = Value> {
    node: Rc<StoreNode>,
    _type: PhantomData<fn() -> T>,
}

impl Store {
    /// Creates a store with default [`StoreOptions`].
    pub fn new(value: impl Into<Value>) -> Self {
        Self::builder(value).build()
    }

    pub fn with_options(value: impl Into<Value>, options: StoreOptions) -> Self {
        Self::builder(value).options(options).build()
    }

    pub fn builder(value: impl Into<Value>) -> StoreBuilder {
        StoreBuilder::new(value.into())
    }
}

impl<T: Serialize> Store<T> {
    /// Creates a store whose snapshot is `value` converted to a [`Value`].
    pub fn typed(value: &T) -> Result<Self> {
        Ok(StoreBuilder::new(Value::from_serialize(value)?).build_typed())
    }

    /// Replaces the whole snapshot with `value`.
    pub fn replace_with(&self, value: &T) -> Result<()> {
        self.update_advanced(Value::from_serialize(value)?, "")?;
        Ok(())
    }
}

impl<T> Store<T> {
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// The current snapshot.
    pub fn current(&self) -> Value {
        self.node.value.borrow().clone()
    }

    /// The current snapshot converted to `T`.
    pub fn value(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.current().deserialize_into()
    }

    /// Expands the macro tokens of `path` against the current snapshot.
    pub fn resolve(&self, path: &str) -> String {
        self.node.resolve_in(path, &self.current())
    }

    /// Value at `path` in the current snapshot. An empty path returns the whole snapshot.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.get_from(path, &self.current())
    }

    /// Value at `path` in `value`, with macros expanded against `value`.
    pub fn get_from(&self, path: &str, value: &Value) -> Option<Value> {
        let resolved = self.node.resolve_in(path, value);
        let ret = lookup(value, path, &resolved).cloned();
        self.node.echo(
            TraceEvent::GlobalGet,
            None,
            &[
                TraceArg::Value(ret.as_ref()),
                TraceArg::Str(path),
                TraceArg::Str(&resolved),
            ],
        );
        ret
    }

    pub fn get_as<V: DeserializeOwned>(&self, path: &str) -> Result<Option<V>> {
        self.get(path).map(|v| v.deserialize_into()).transpose()
    }

    /// Computes the snapshot that storing `value` at `path` would produce, without committing it.
    ///
    /// A path that expands to nothing replaces the whole snapshot.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<Value> {
        let current = self.current();
        let resolved = self.node.resolve_in(path, &current);
        self.node
            .set_resolved(&current, resolved.is_empty(), &resolved, value.into())
    }

    /// Stores `obj` at `path` and notifies every subscriber whose value changed.
    ///
    /// The new snapshot is committed if `obj` is not the value already stored at `path` or if
    /// any subscriber was notified. Returns the candidate snapshot, committed or not.
    ///
    /// Subscribers are visited in no particular order. They all observe the same candidate,
    /// while reads of the store from inside a callback still see the previous snapshot.
    /// A path that contradicts the shape of the snapshot fails with
    /// [`Error::PathConflict`](crate::Error::PathConflict) before anyone is notified.
    pub fn update(&self, obj: impl Into<Value>, path: &str) -> Result<Value> {
        let ret = self.update_raw(obj.into(), path, false)?;
        self.node.echo(
            TraceEvent::Update,
            None,
            &[TraceArg::Value(Some(&ret)), TraceArg::Str(path)],
        );
        Ok(ret)
    }

    /// Like [`update`](Self::update), but `obj` is the whole new snapshot. `path` only selects
    /// the value that is compared and returned.
    pub fn update_advanced(&self, obj: impl Into<Value>, path: &str) -> Result<Option<Value>> {
        let candidate = self.update_raw(obj.into(), path, true)?;
        let ret = self.get_from(path, &candidate);
        self.node.echo(
            TraceEvent::Update,
            None,
            &[TraceArg::Value(ret.as_ref()), TraceArg::Str(path)],
        );
        Ok(ret)
    }

    pub fn update_with<V: Serialize + ?Sized>(&self, value: &V, path: &str) -> Result<Value> {
        self.update(Value::from_serialize(value)?, path)
    }

    fn update_raw(&self, obj: Value, path: &str, advanced: bool) -> Result<Value> {
        let node = &self.node;
        let old = self.current();
        let resolved = node.resolve_in(path, &old);
        node.echo(
            TraceEvent::PreUpdate,
            None,
            &[
                TraceArg::Value(Some(&obj)),
                TraceArg::Str(path),
                TraceArg::Str(&resolved),
            ],
        );

        let mut changed = differs(&old, Some(&obj), path, &resolved);
        let whole = advanced || resolved.is_empty();
        let candidate = node.set_resolved(&old, whole, &resolved, obj)?;

        let subs = node.subs.borrow().snapshot();
        for (key, sub) in subs {
            if !node.subs.borrow().is_live(key, sub.id) {
                continue;
            }
            let sub_resolved = node.resolve_in(&sub.path, &candidate);
            let value = lookup(&candidate, &sub.path, &sub_resolved);
            if differs(&old, value, &sub.path, &sub_resolved) {
                (sub.callback)(value);
                changed = true;
            }
        }
        if changed {
            *node.value.borrow_mut() = candidate.clone();
        }
        Ok(candidate)
    }

    /// Whether `candidate` differs by identity from the current value at `resolved`.
    /// An empty `resolved` compares against the whole snapshot.
    pub fn diff(&self, candidate: Option<&Value>, resolved: &str) -> bool {
        differs(&self.current(), candidate, resolved, resolved)
    }

    /// Calls `f` with the current value at `path`, then again whenever it changes.
    pub fn subscribe(&self, f: impl Fn(Option<&Value>) + 'static, path: &str) -> Subscription {
        self.subscribe_rc(Rc::new(f), path)
    }

    /// Like [`subscribe`](Self::subscribe), keyed by the identity of `callback`.
    ///
    /// Subscribing a callback that is already registered replaces its path. The guard
    /// returned by the earlier call no longer has any effect.
    pub fn subscribe_rc(&self, callback: Callback, path: &str) -> Subscription {
        callback(self.get(path).as_ref());
        let (key, id) = self.node.subs.borrow_mut().insert(callback, path);
        Subscription::from_weak_fn(Rc::downgrade(&self.node), move |node: Rc<StoreNode>| {
            node.unsubscribe(key, id)
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.node.subs.borrow().entries.len()
    }

    pub fn unsubscribe_all(&self) {
        let entries = replace(&mut self.node.subs.borrow_mut().entries, SlabMap::new());
        drop(entries);
    }

    /// Detaches every subscriber. The store itself stays usable.
    pub fn destroy(&self) {
        self.unsubscribe_all();
    }

    pub fn context(&self) -> MacroContext {
        self.node.cx.borrow().clone()
    }
    /// The url `$url` expands with.
    ///
    /// This is the macro context, not the snapshot: the `url` key written by
    /// [`set_url`](Self::set_url) can be changed directly and is read with `get("url")`.
    pub fn url(&self) -> String {
        self.node.cx.borrow().url.clone()
    }
    pub fn suffix(&self) -> String {
        self.node.cx.borrow().suffix.clone()
    }

    /// `<url>/<suffix>`, what `$url` expands to.
    pub fn index(&self) -> String {
        self.node.cx.borrow().index()
    }

    /// Sets the macro url and writes it to the snapshot at `url`.
    ///
    /// The first `.` of `url` becomes `/`. An empty url is stored as `initial`.
    pub fn set_url(&self, url: &str) -> Result<Value> {
        let url = if url.is_empty() {
            String::from("initial")
        } else {
            url.replacen('.', "/", 1)
        };
        self.node.cx.borrow_mut().url = url.clone();
        self.update(url, "url")
    }

    /// Sets the macro suffix and writes it to the snapshot at `suffix`.
    pub fn set_suffix(&self, suffix: &str) -> Result<Value> {
        self.node.cx.borrow_mut().suffix = suffix.to_owned();
        self.update(suffix, "suffix")
    }

    pub fn debug(&self) -> DebugFlags {
        self.node.debug.borrow().clone()
    }

    /// Replaces the enabled trace events and persists them.
    pub fn set_debug(&self, flags: DebugFlags) {
        let text = flags.to_string();
        *self.node.debug.borrow_mut() = flags;
        if let Err(e) = self.node.storage.store(&self.node.debug_key, &text) {
            log::warn!(target: "pathstore", "{}: {e}", self.node.name);
        }
    }

    /// Writes `value` at `<base>.<key>`, reporting `pre set` / `set` events for `key`.
    pub fn set_field(&self, base: &str, key: &str, value: impl Into<Value>) -> Result<Value> {
        self.write_field(base, key, value.into(), |this, value, path| {
            this.update(value, path)
        })
    }

    /// Like [`set_field`](Self::set_field) with [`update_advanced`](Self::update_advanced).
    pub fn set_field_advanced(
        &self,
        base: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        self.write_field(base, key, value.into(), |this, value, path| {
            this.update_advanced(value, path)
        })
    }

    fn write_field<R>(
        &self,
        base: &str,
        key: &str,
        value: Value,
        f: impl FnOnce(&Self, Value, &str) -> Result<R>,
    ) -> Result<R> {
        let path = path::join(base, key);
        self.node.echo(
            TraceEvent::PreSet,
            Some(key),
            &[TraceArg::Str(&path), TraceArg::Value(Some(&value))],
        );
        let ret = f(self, value.clone(), &path)?;
        self.node.echo(
            TraceEvent::Set,
            Some(key),
            &[TraceArg::Str(&path), TraceArg::Value(Some(&value))],
        );
        Ok(ret)
    }

    /// Reads `<base>.<key>`, reporting a `get` event for `key`.
    pub fn get_field(&self, base: &str, key: &str) -> Option<Value> {
        let path = path::join(base, key);
        let ret = self.get(&path);
        self.node.echo(
            TraceEvent::Get,
            Some(key),
            &[TraceArg::Str(&path), TraceArg::Value(ret.as_ref())],
        );
        ret
    }

    pub(crate) fn echo(&self, event: TraceEvent, field: Option<&str>, args: &[TraceArg]) {
        self.node.echo(event, field, args)
    }
}

impl<T> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Store");
        d.field("name", &self.node.name);
        match self.node.value.try_borrow() {
            Ok(value) => d.field("value", &value.to_string()),
            Err(_) => d.field("value", &"<borrowed>"),
        };
        d.finish()
    }
}

/// Configures a [`Store`] before creating it.
#[must_use]
pub struct StoreBuilder {
    value: Value,
    options: StoreOptions,
    storage: Rc<dyn DebugStorage>,
    sink: Rc<dyn TraceSink>,
}

impl StoreBuilder {
    fn new(value: Value) -> Self {
        Self {
            value,
            options: StoreOptions::default(),
            storage: Rc::new(NoopStorage),
            sink: Rc::new(LogSink),
        }
    }

    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = name.into();
        self
    }
    pub fn context(mut self, url: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.options.url = url.into();
        self.options.suffix = suffix.into();
        self
    }

    /// Where debug flags are loaded from and saved to. Defaults to [`NoopStorage`].
    pub fn storage(mut self, storage: Rc<dyn DebugStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Receiver of enabled trace events. Defaults to [`LogSink`].
    pub fn sink(mut self, sink: Rc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Store {
        self.build_typed()
    }

    /// Builds a store typed as `T`. The initial value is not checked against `T`.
    pub fn build_typed<T>(self) -> Store<T> {
        let debug_key = self.options.debug_key();
        let debug = match self.storage.load(&debug_key) {
            Ok(flags) => flags.map(|s| DebugFlags::parse(&s)).unwrap_or_default(),
            Err(e) => {
                log::warn!(target: "pathstore", "{}: {e}", self.options.name);
                DebugFlags::new()
            }
        };
        Store {
            node: Rc::new(StoreNode {
                cx: RefCell::new(self.options.macro_context()),
                name: self.options.name,
                debug_key,
                value: RefCell::new(self.value),
                subs: RefCell::new(Subscribers::new()),
                debug: RefCell::new(debug),
                storage: self.storage,
                sink: self.sink,
            }),
            _type: PhantomData,
        }
    }
}

struct StoreNode {
    name: String,
    debug_key: String,
    value: RefCell<Value>,
    cx: RefCell<MacroContext>,
    subs: RefCell<Subscribers>,
    debug: RefCell<DebugFlags>,
    storage: Rc<dyn DebugStorage>,
    sink: Rc<dyn TraceSink>,
}

impl StoreNode {
    fn resolve_in(&self, path: &str, value: &Value) -> String {
        let resolved = path::resolve(path, &self.cx.borrow(), value);
        self.echo(
            TraceEvent::Replace,
            None,
            &[TraceArg::Str(&resolved), TraceArg::Str(path)],
        );
        resolved
    }

    fn set_resolved(&self, base: &Value, whole: bool, resolved: &str, value: Value) -> Result<Value> {
        let ret = if whole {
            value
        } else {
            base.set_in(path::deep_keys(resolved).as_slice(), value)?
        };
        self.echo(
            TraceEvent::GlobalSet,
            None,
            &[TraceArg::Str(resolved), TraceArg::Value(Some(&ret))],
        );
        Ok(ret)
    }

    fn unsubscribe(&self, key: usize, id: u64) {
        let removed = self.subs.borrow_mut().remove(key, id);
        drop(removed);
    }

    fn echo(&self, event: TraceEvent, field: Option<&str>, args: &[TraceArg]) {
        let (plain, scoped) = {
            let debug = self.debug.borrow();
            if debug.is_empty() {
                return;
            }
            let scoped = field
                .map(|field| format!("{event} {field}"))
                .filter(|name| debug.contains(name));
            (debug.enables(event), scoped)
        };
        if plain {
            self.sink.trace(&self.name, &event.to_string(), args);
        }
        if let Some(name) = scoped {
            self.sink.trace(&self.name, &name, args);
        }
    }
}

#[derive(Clone)]
struct Subscriber {
    id: u64,
    path: String,
    callback: Callback,
}

struct Subscribers {
    entries: SlabMap<Subscriber>,
    next_id: u64,
}

impl Subscribers {
    fn new() -> Self {
        Self {
            entries: SlabMap::new(),
            next_id: 0,
        }
    }

    fn insert(&mut self, callback: Callback, path: &str) -> (usize, u64) {
        self.next_id += 1;
        let id = self.next_id;
        let existing = self
            .entries
            .iter()
            .find(|(_, s)| Rc::ptr_eq(&s.callback, &callback))
            .map(|(key, _)| key);
        if let Some(key) = existing {
            if let Some(s) = self.entries.get_mut(key) {
                s.id = id;
                s.path = path.to_owned();
            }
            return (key, id);
        }
        let key = self.entries.insert(Subscriber {
            id,
            path: path.to_owned(),
            callback,
        });
        (key, id)
    }

    fn remove(&mut self, key: usize, id: u64) -> Option<Subscriber> {
        if self.entries.get(key)?.id != id {
            return None;
        }
        self.entries.remove(key)
    }

    fn is_live(&self, key: usize, id: u64) -> bool {
        self.entries.get(key).is_some_and(|s| s.id == id)
    }

    fn snapshot(&self) -> Vec<(usize, Subscriber)> {
        self.entries.iter().map(|(key, s)| (key, s.clone())).collect()
    }
}

// Reads decide on the expression: a macro that expands to nothing reads the empty key.
// Writes decide on the expansion: an empty expansion replaces the whole value.
fn lookup<'a>(value: &'a Value, path: &str, resolved: &str) -> Option<&'a Value> {
    if path.is_empty() {
        Some(value)
    } else {
        value.get_in(path::deep_keys(resolved).as_slice())
    }
}

fn differs(old: &Value, candidate: Option<&Value>, path: &str, resolved: &str) -> bool {
    !Value::same_opt(lookup(old, path, resolved), candidate)
}
