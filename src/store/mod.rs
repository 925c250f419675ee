//! Persisted client state behind a small key-value capability.
//!
//! The reader keeps three values between sessions: the favorite ids, the read
//! ids and the last-visit marker. They live under fixed string keys with
//! JSON-encoded values. The backend is injected through [`KeyValueStore`] so
//! the status logic can run against [`MemoryStore`] in tests and
//! [`SqliteStore`] in the binary.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Keys of the persisted client state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// JSON array of favorite item ids.
    Favorites,
    /// JSON array of read item ids.
    ReadItems,
    /// JSON string, RFC 3339 timestamp of the previous visit.
    LastVisit,
}

impl StateKey {
    /// Storage name of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            StateKey::Favorites => "Favorites",
            StateKey::ReadItems => "ReadArticles",
            StateKey::LastVisit => "LastVisit",
        }
    }
}

/// String-valued storage with get/set/delete on typed keys.
///
/// A missing key is `Ok(None)`, never an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: StateKey)
        -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(&self, key: StateKey, value: &str)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(&self, key: StateKey) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Read and decode a JSON value.
///
/// An undecodable value is logged and reported as absent: the formats are
/// not versioned, so a value we cannot read is treated like a fresh install.
pub async fn load_json<S, T>(store: &S, key: StateKey) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key = key.as_str(), error = %e, "Ignoring undecodable stored value");
            Ok(None)
        }
    }
}

/// Encode and write a JSON value.
pub async fn save_json<S, T>(store: &S, key: StateKey, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
