use std::{cell::RefCell, rc::Rc};

use serde::de::DeserializeOwned;

use crate::{
    trace::{TraceArg, TraceEvent},
    Result, Store, Subscription, Value,
};

/// The latest value at one path of a store.
///
/// Created by [`Store::watch`]. The value is available right away and follows every change
/// until the `Watch` is dropped.
pub struct Watch<T = Value> {
    store: Store<T>,
    path: String,
    latest: Rc<RefCell<Option<Value>>>,
    _subscription: Subscription,
}

impl<T> Store<T> {
    pub fn watch(&self, path: &str) -> Watch<T> {
        let latest = Rc::new(RefCell::new(None));
        let subscription = self.subscribe(
            {
                let latest = latest.clone();
                move |value| *latest.borrow_mut() = value.cloned()
            },
            path,
        );
        Watch {
            store: self.clone(),
            path: path.to_owned(),
            latest,
            _subscription: subscription,
        }
    }
}

impl<T> Watch<T> {
    pub fn get(&self) -> Option<Value> {
        let value = self.latest.borrow().clone();
        self.store.echo(
            TraceEvent::Use,
            None,
            &[TraceArg::Value(value.as_ref()), TraceArg::Str(&self.path)],
        );
        value
    }

    pub fn get_as<V: DeserializeOwned>(&self) -> Result<Option<V>> {
        self.get().map(|v| v.deserialize_into()).transpose()
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}
