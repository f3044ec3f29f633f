use derive_ex::Ex;
use serde::{Deserialize, Serialize};

use crate::{path::MacroContext, storage::debug_key};

/// Construction settings of a [`Store`](crate::Store).
///
/// Every field is optional when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Ex)]
#[derive_ex(Default)]
#[default(Self::new("sub"))]
#[serde(default)]
pub struct StoreOptions {
    /// Name reported with trace events and used in the debug flag key.
    pub name: String,
    /// Prefix of the debug flag key.
    pub namespace: String,
    /// Initial `url` of the macro context.
    pub url: String,
    /// Initial `suffix` of the macro context.
    pub suffix: String,
}

impl StoreOptions {
    pub const DEFAULT_NAMESPACE: &'static str = "pathstore";

    pub fn new(name: impl Into<String>) -> Self {
        let cx = MacroContext::default();
        Self {
            name: name.into(),
            namespace: Self::DEFAULT_NAMESPACE.to_owned(),
            url: cx.url,
            suffix: cx.suffix,
        }
    }

    pub fn debug_key(&self) -> String {
        debug_key(&self.namespace, &self.name)
    }

    pub(crate) fn macro_context(&self) -> MacroContext {
        MacroContext::new(self.url.clone(), self.suffix.clone())
    }
}
