//! Storage error types

/// Errors raised by persistent storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// SQLite backend failure (disabled storage, locked file, full disk).
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// Value could not be encoded before writing.
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),

    /// Stored bytes are not valid JSON for the requested type.
    #[error("deserialization error for '{key}': {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend refused the write (quota exceeded or read-only store).
    #[error("storage quota exceeded writing '{0}'")]
    QuotaExceeded(String),
}
