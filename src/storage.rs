use std::{cell::RefCell, collections::HashMap};

use parse_display::Display;

/// Failure of a [`DebugStorage`] backend.
#[derive(Display, Debug, Clone, PartialEq, Eq)]
#[display("debug storage unavailable: {0}")]
pub struct StorageError(pub String);

impl std::error::Error for StorageError {}

/// Key-value side channel where a store persists its debug flags.
///
/// The store reads its flags once at construction and writes them whenever they are
/// replaced. Errors are logged and otherwise ignored.
pub trait DebugStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn store(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Storage key of the debug flags of store `name`.
pub fn debug_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}/debug")
}

/// Remembers nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStorage;

impl DebugStorage for NoopStorage {
    fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
    fn store(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-process storage, shared by cloning the `Rc` it is handed out in.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }
}

impl DebugStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }
    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert(key, value);
        Ok(())
    }
}
