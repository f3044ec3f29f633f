// #![include_doc("../README.md", start)]
//! # pathstore
//!
//! `pathstore` is a path-addressable state container with per-path change subscriptions, designed to sit under UI component trees.
//!
//! ## Features
//!
//! - Dotted paths with bracket accessors (`profile.name`, `items[0]`, `map["key"]`)
//! - Copy-on-write snapshots that share every untouched branch
//! - Identity-based change detection
//! - Subscribers keyed by path, notified only when their value changes
//! - `$url` / `$suf` path macros expanded against a per-store context
//! - Opt-in tracing of store operations through the `log` crate
//!
//! ```rust
//! use pathstore::{Store, Value};
//! use serde_json::json;
//!
//! let store = Store::new(json!({ "profile": { "name": "x" } }));
//! let _s = store.subscribe(|name| println!("name: {name:?}"), "profile.name");
//!
//! store.update("y", "profile.name").unwrap();
//! assert_eq!(store.get("profile.name"), Some(Value::from("y")));
//! ```
//!
//! ### Change detection
//!
//! A value counts as changed when it is not the same value as before. Scalars are compared by value, lists and maps by allocation.
//! Updating `profile.name` copies the root and `profile` and leaves every other branch shared, so subscribers of `profile.name` and `profile` are notified while subscribers of unrelated branches are not.
//!
//! A list or map that is structurally equal to the old one but was built separately is a change.
//!
//! ### Path macros
//!
//! A path segment starting with `$` is a macro:
//!
//! - `$url` expands to `<url>/<suffix>` of the store's context
//! - `$suf` expands to `<suffix>`
//! - any other token is read from the top-level key of the same name, `$` included
//!
//! ## License
//!
//! This project is dual licensed under Apache-2.0/MIT. See the two LICENSE-\* files for details.
//!
//! ## Contribution
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.
// #![include_doc("../README.md", end)]
