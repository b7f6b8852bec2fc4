//! SQLite storage backend with in-memory cache.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use dashmap::DashMap;

use super::StorageBackend;
use crate::error::StorageError;

/// SQLite-backed storage with a DashMap read cache.
///
/// Data persists across process restarts. Uses WAL journal mode.
pub struct SqliteBackend {
    client: Client,
    cache: DashMap<String, Vec<u8>>,
}

impl SqliteBackend {
    /// Open (or create) the storage database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;
        Self::init(client).await
    }

    /// Open an in-memory database. Data is lost when the backend is dropped.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;
        Self::init(client).await
    }

    async fn init(client: Client) -> Result<Self, StorageError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS storage (
                        key TEXT PRIMARY KEY,
                        value BLOB NOT NULL
                    )",
                    [],
                )
            })
            .await?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value.clone()));
        }

        let key_owned = key.to_string();
        let result = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM storage WHERE key = ?")?;
                let mut rows = stmt.query([&key_owned])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get::<_, Vec<u8>>(0)?)),
                    None => Ok(None),
                }
            })
            .await?;

        if let Some(ref value) = result {
            self.cache.insert(key.to_string(), value.clone());
        }

        Ok(result)
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let key_owned = key.to_string();
        let value_clone = value.clone();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO storage (key, value) VALUES (?, ?)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![&key_owned, &value_clone],
                )
            })
            .await?;

        self.cache.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key_owned = key.to_string();

        self.client
            .conn(move |conn| conn.execute("DELETE FROM storage WHERE key = ?", [&key_owned]))
            .await?;

        self.cache.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        self.client
            .conn(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT key FROM storage WHERE key LIKE ? ESCAPE '\\' ORDER BY key")?;
                let rows = stmt.query_map([&pattern], |row| row.get(0))?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(StorageError::from)
    }
}
