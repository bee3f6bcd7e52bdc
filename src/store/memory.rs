//! In-memory draft store

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::DraftStore;
use crate::error::{Error, Result};

/// A [`DraftStore`] kept in process memory; clones share the same documents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.documents
            .lock()
            .map_err(|_| Error::store("memory store lock poisoned"))
    }
}

impl DraftStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.documents()?.get(key).cloned())
    }

    fn set(&self, key: &str, document: &str) -> Result<()> {
        self.documents()?
            .insert(key.to_string(), document.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.documents()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_documents() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.set("cart", "[]").unwrap();
        assert_eq!(view.get("cart").unwrap().as_deref(), Some("[]"));
        view.clear("cart").unwrap();
        assert!(store.get("cart").unwrap().is_none());
    }
}
