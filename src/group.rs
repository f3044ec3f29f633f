use std::{cell::Cell, rc::Rc};

use crate::{Store, Subscription, Value};

#[cfg(test)]
mod tests;

/// The subscriptions of one consumer, with a pending flag that coalesces notifications.
///
/// Every notification received through the group marks it pending. A consumer renders once
/// per batch by calling [`flush`](Self::flush) from whatever deferred tick its environment
/// provides.
#[derive(Default)]
pub struct SubscriptionGroup {
    subscriptions: Vec<Subscription>,
    pending: Rc<Cell<bool>>,
}

impl SubscriptionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `f` to `path` of `store` and marks the group pending.
    pub fn subscribe<T>(
        &mut self,
        store: &Store<T>,
        path: &str,
        f: impl Fn(Option<&Value>) + 'static,
    ) {
        let pending = self.pending.clone();
        let subscription = store.subscribe(
            move |value| {
                f(value);
                pending.set(true);
            },
            path,
        );
        self.subscriptions.push(subscription);
        self.pending.set(true);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Returns whether the group was pending and clears the flag.
    pub fn take_pending(&self) -> bool {
        self.pending.replace(false)
    }

    /// Calls `render` once if anything arrived since the last flush.
    pub fn flush(&self, render: impl FnOnce()) -> bool {
        let pending = self.take_pending();
        if pending {
            render();
        }
        pending
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Drops every subscription and clears the pending flag.
    pub fn unsubscribe_all(&mut self) {
        self.subscriptions.clear();
        self.pending.set(false);
    }
}
