//! A path-addressable state container with per-path change subscriptions.
//!
//! ```
//! use pathstore::{Store, Value};
//! use serde_json::json;
//!
//! let store = Store::new(json!({ "profile": { "name": "x" } }));
//! let _s = store.subscribe(|name| println!("name: {name:?}"), "profile.name");
//!
//! store.update("y", "profile.name").unwrap();
//! assert_eq!(store.get("profile.name"), Some(Value::from("y")));
//! ```

mod emit;
mod error;
mod group;
mod options;
pub mod path;
mod storage;
mod store;
mod subscription;
mod trace;
mod value;
mod watch;

#[cfg(doctest)]
mod tests_readme;

pub use error::*;
pub use group::*;
pub use options::*;
pub use path::MacroContext;
pub use storage::*;
pub use store::*;
pub use subscription::*;
pub use trace::*;
pub use value::*;
pub use watch::*;
