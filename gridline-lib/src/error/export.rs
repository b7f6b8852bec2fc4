//! Export error types

/// Errors that terminate an export job.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// None of the row sources produced any rows.
    #[error("No data available for export")]
    NoData,

    /// A row source collaborator failed.
    #[error("Failed to fetch rows for export: {0}")]
    Fetch(String),

    /// The CSV writer rejected a record.
    #[error("CSV generation failed: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook writer rejected the data.
    #[error("Excel generation failed: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    /// Writing the artifact to its destination failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Another export is still running for this table.
    #[error("An export is already in progress")]
    InProgress,
}
