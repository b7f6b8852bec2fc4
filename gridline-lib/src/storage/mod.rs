//! Persistent key/value storage.
//!
//! Table layout and view preferences are stored as JSON under string keys.
//! A [`StorageBackend`] handles raw bytes; [`Storage`] wraps it with typed
//! serialization via serde_json.

mod memory;
mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Backend trait for raw byte storage.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get raw bytes for a key.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Set raw bytes for a key.
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Get all keys matching a prefix.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Typed storage provider.
///
/// Cheap to clone; clones share the backend.
///
/// # Example
///
/// ```ignore
/// use gridline_lib::storage::{MemoryBackend, Storage};
///
/// let storage = Storage::new(MemoryBackend::new());
/// storage.set("users-column-order", &vec!["name", "email"]).await?;
/// let order: Option<Vec<String>> = storage.get("users-column-order").await?;
/// ```
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Create a new storage provider with the given backend.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Create a provider sharing an existing backend.
    pub fn from_arc(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// In-memory storage, lost when the process exits.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Get a typed value for a key.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get_bytes(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StorageError::Deserialization {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Get a typed value for a key, returning a default if not found.
    pub async fn get_or<T: DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, StorageError> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Set a typed value for a key.
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value).map_err(StorageError::Serialization)?;
        self.backend.set_bytes(key, bytes).await
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key).await
    }

    /// Get all keys matching a prefix.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.backend.keys_with_prefix(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[tokio::test]
    async fn test_typed_round_trip() {
        let storage = Storage::in_memory();
        let order = vec!["name".to_string(), "email".to_string()];
        storage.set("users-column-order", &order).await.unwrap();

        let loaded: Option<Vec<String>> = storage.get("users-column-order").await.unwrap();
        assert_eq!(loaded, Some(order));
    }

    #[tokio::test]
    async fn test_corrupt_json_is_deserialization_error() {
        let backend = MemoryBackend::new();
        backend
            .set_bytes("broken", b"{not json".to_vec())
            .await
            .unwrap();
        let storage = Storage::new(backend);

        let result: Result<Option<HashMap<String, f32>>, _> = storage.get("broken").await;
        assert!(matches!(
            result,
            Err(StorageError::Deserialization { ref key, .. }) if key == "broken"
        ));
    }

    #[tokio::test]
    async fn test_get_or_and_delete() {
        let storage = Storage::in_memory();
        assert_eq!(storage.get_or("missing", 7u32).await.unwrap(), 7);

        storage.set("present", &3u32).await.unwrap();
        storage.delete("present").await.unwrap();
        storage.delete("present").await.unwrap();
        assert_eq!(storage.get::<u32>("present").await.unwrap(), None);
    }
}
