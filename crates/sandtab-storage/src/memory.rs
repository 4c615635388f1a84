//! In-process key-value store

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{KeyValueStore, Result};

/// Volatile store backed by a shared map. Clones share the same records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("session-1-100", "a=b;example.com ").unwrap();
        assert_eq!(
            other.get("session-1-100").unwrap().as_deref(),
            Some("a=b;example.com ")
        );

        other.delete("session-1-100").unwrap();
        assert!(store.is_empty());

        // Deleting again is fine
        store.delete("session-1-100").unwrap();
    }
}
