//! In-memory key-value store.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{KeyValueStore, StorageError};

/// A [`KeyValueStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let map = self.entries.read();
        Ok(keys.iter().map(|key| map.get(*key).cloned()).collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.write().clear();
        Ok(())
    }
}
