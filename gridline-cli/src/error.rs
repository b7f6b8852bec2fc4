//! CLI error type

use gridline_lib::error::ApiError;
use gridline_lib::error::ExportError;
use gridline_lib::error::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rows file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid table config {0}: {1}")]
    Config(String, #[source] serde_json::Error),

    /// Arguments that parse but cannot be used together.
    #[error("{0}")]
    Usage(String),
}
