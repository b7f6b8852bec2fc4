//! Export progress notifications

use std::fmt;

use log::error;
use log::info;

/// Phase of an export job. Each job reports through one notification key,
/// so a UI can update a single toast in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPhase {
    Preparing,
    /// Selected rows are being loaded from the server.
    Fetching,
    Processing,
    Success,
    Error,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preparing => "preparing",
            Self::Fetching => "fetching",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Receives export progress.
pub trait Notifier: Send + Sync {
    /// Shows or replaces the notification identified by `key`.
    fn notify(&self, key: &str, phase: ExportPhase, message: &str);
}

/// Writes export progress to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, key: &str, phase: ExportPhase, message: &str) {
        match phase {
            ExportPhase::Error => error!("[{}] {}", key, message),
            _ => info!("[{}] {}: {}", key, phase, message),
        }
    }
}

/// Discards notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _key: &str, _phase: ExportPhase, _message: &str) {}
}
