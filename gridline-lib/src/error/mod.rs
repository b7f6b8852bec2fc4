//! Error types

mod api;
mod export;
mod field;
mod storage;

pub use api::*;
pub use export::*;
pub use field::*;
pub use storage::*;

/// Top-level error for operations that cross module boundaries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// REST boundary failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Persistent storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Export job failure.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Record field access failure.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
