//! In-memory storage backend using DashMap

use async_trait::async_trait;
use dashmap::DashMap;

use super::StorageBackend;
use crate::error::StorageError;

/// An in-memory backend backed by a concurrent hash map.
///
/// Used for tests and as the session-only fallback when no database is
/// available. An optional byte quota makes writes fail the way a full
/// browser store would.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: DashMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
            quota: None,
        }
    }

    /// Creates a backend that rejects writes once `bytes` would be exceeded.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            store: DashMap::new(),
            quota: Some(bytes),
        }
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.store
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.value().len())
            .sum()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.store.get(key).map(|entry| entry.value().clone()))
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        if let Some(quota) = self.quota
            && self.used_bytes_excluding(key) + value.len() > quota
        {
            return Err(StorageError::QuotaExceeded(key.to_string()));
        }
        self.store.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .store
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_quota_rejects_oversized_write() {
        let backend = MemoryBackend::with_quota(8);
        backend.set_bytes("a", vec![0; 6]).await.unwrap();
        // Overwriting the same key only counts the new value.
        backend.set_bytes("a", vec![0; 8]).await.unwrap();

        let err = backend.set_bytes("b", vec![0; 1]).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded(key) if key == "b"));
    }

    #[tokio::test]
    async fn test_keys_with_prefix_sorted() {
        let backend = MemoryBackend::new();
        backend.set_bytes("users-column-sizing", vec![]).await.unwrap();
        backend.set_bytes("users-column-order", vec![]).await.unwrap();
        backend.set_bytes("projects-column-order", vec![]).await.unwrap();

        let keys = backend.keys_with_prefix("users-").await.unwrap();
        assert_eq!(keys, vec!["users-column-order", "users-column-sizing"]);
    }
}
