use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{KeyValueStore, StateKey, StoreError};

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<StateKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_map<R>(&self, f: impl FnOnce(&mut HashMap<StateKey, String>) -> R) -> R {
        // A poisoned lock only means another test thread panicked mid-write;
        // the map itself is still usable.
        let mut guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StateKey) -> Result<Option<String>, StoreError> {
        Ok(self.with_map(|m| m.get(&key).cloned()))
    }

    async fn set(&self, key: StateKey, value: &str) -> Result<(), StoreError> {
        self.with_map(|m| m.insert(key, value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: StateKey) -> Result<(), StoreError> {
        self.with_map(|m| m.remove(&key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get(StateKey::LastVisit).await.unwrap(), None);

        store.set(StateKey::LastVisit, "\"x\"").await.unwrap();
        assert_eq!(
            store.get(StateKey::LastVisit).await.unwrap().as_deref(),
            Some("\"x\"")
        );

        store.delete(StateKey::LastVisit).await.unwrap();
        assert_eq!(store.get(StateKey::LastVisit).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set(StateKey::Favorites, "[]").await.unwrap();
        assert!(b.get(StateKey::Favorites).await.unwrap().is_some());
    }
}
