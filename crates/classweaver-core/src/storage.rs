//! Session-scoped key/value storage capability.
//!
//! The session store and action-status tracker persist small JSON snapshots
//! into storage that lives exactly as long as the client session. This module
//! defines the capability as a trait so the normalization and session logic
//! can be tested against an in-memory implementation, while an embedding
//! application may back it with whatever scope-bound store it owns.

use std::collections::HashMap;
use std::sync::Mutex;

/// Key/value storage scoped to the lifetime of one client session.
///
/// Values are JSON-encoded strings. Implementations must tolerate concurrent
/// readers; the client layer guarantees that each key family has a single
/// writer.
pub trait SessionStorage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, overwriting any previous value.
    fn set_item(&self, key: &str, value: &str);

    /// Removes the value stored under `key`. Removing an absent key is a no-op.
    fn remove_item(&self, key: &str);
}

/// In-memory `SessionStorage` implementation.
///
/// This is the default backing store for native use and the fake used by
/// tests: entries vanish when the value is dropped, which matches the
/// session-scoped lifetime of the browser storage it stands in for.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("storage lock poisoned").len()
    }

    /// Returns true when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v");
        assert_eq!(storage.get_item("k"), Some("v".to_string()));
    }

    #[test]
    fn test_get_absent_returns_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("missing"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "first");
        storage.set_item("k", "second");
        assert_eq!(storage.get_item("k"), Some("second".to_string()));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_remove() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v");
        storage.remove_item("k");
        assert_eq!(storage.get_item("k"), None);
        // Removing again is a no-op
        storage.remove_item("k");
        assert!(storage.is_empty());
    }
}
