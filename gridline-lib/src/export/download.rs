//! Artifact delivery

use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use log::info;

use super::ExportArtifact;
use crate::error::ExportError;

/// Hands a finished artifact to the user.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Delivers the artifact and returns where it ended up.
    async fn download(&self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError>;
}

/// Saves artifacts into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Downloader for FileDownloader {
    async fn download(&self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&artifact.filename);
        tokio::fs::write(&path, &artifact.bytes).await?;
        info!(
            "saved {} ({}, {} bytes)",
            path.display(),
            artifact.mime_type,
            artifact.bytes.len()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;

    #[tokio::test]
    async fn test_writes_into_directory() {
        let dir = std::env::temp_dir().join(format!("gridline-download-{}", uuid::Uuid::new_v4()));
        let downloader = FileDownloader::new(&dir);
        let artifact = ExportArtifact {
            filename: "users-export.csv".to_string(),
            mime_type: ExportFormat::Csv.mime_type(),
            bytes: b"id\n1".to_vec(),
        };

        let path = downloader.download(&artifact).await.unwrap();

        assert_eq!(path, dir.join("users-export.csv"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"id\n1");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
