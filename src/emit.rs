use std::future::Future;

use futures::{future::LocalBoxFuture, FutureExt};

use crate::{
    trace::{TraceArg, TraceEvent},
    Error, Result, Store, Value,
};


impl<T> Store<T> {
    /// Returns a function that computes a value from its argument and the current snapshot,
    /// then stores it at `path`.
    ///
    /// Each call reports `emit` and `emit <name>` trace events.
    pub fn make_emit_now<A>(
        &self,
        name: &str,
        path: &str,
        f: impl Fn(A, &Value) -> Value,
    ) -> impl Fn(A) -> Result<Value> {
        let store = self.clone();
        let name = name.to_owned();
        let path = path.to_owned();
        move |args| {
            let ret = store.update(f(args, &store.current()), &path)?;
            store.echo(
                TraceEvent::Emit,
                Some(&name),
                &[TraceArg::Value(Some(&ret)), TraceArg::Str(&path)],
            );
            Ok(ret)
        }
    }

    /// Awaits `producer` and stores its output at `path`.
    ///
    /// If the producer fails, the snapshot is left untouched and the failure is returned as
    /// [`Error::Rejected`] with the producer's error as its cause. Nothing is cancelled: when
    /// several emits are in flight, the last one to finish wins.
    pub async fn emit<E>(
        &self,
        path: &str,
        producer: impl Future<Output = std::result::Result<Value, E>>,
    ) -> Result<Value>
    where
        E: std::error::Error + 'static,
    {
        match producer.await {
            Ok(value) => {
                let ret = self.update(value, path)?;
                self.echo(
                    TraceEvent::Emit,
                    None,
                    &[TraceArg::Value(Some(&ret)), TraceArg::Str(path)],
                );
                Ok(ret)
            }
            Err(e) => {
                log::debug!(target: "pathstore", "{}: emit at `{path}` rejected: {e}", self.name());
                Err(Error::Rejected {
                    cause: Some(Box::new(e)),
                })
            }
        }
    }

    /// Returns a function that starts `f` with its argument and the current snapshot and
    /// [`emit`](Self::emit)s the result at `path`.
    pub fn make_emit<A, Fut, E>(
        &self,
        path: &str,
        f: impl Fn(A, Value) -> Fut,
    ) -> impl Fn(A) -> LocalBoxFuture<'static, Result<Value>>
    where
        T: 'static,
        Fut: Future<Output = std::result::Result<Value, E>> + 'static,
        E: std::error::Error + 'static,
    {
        let store = self.clone();
        let path = path.to_owned();
        move |args| {
            let producer = f(args, store.current());
            let store = store.clone();
            let path = path.clone();
            async move { store.emit(&path, producer).await }.boxed_local()
        }
    }
}
