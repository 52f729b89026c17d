//! File-backed voice resource.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use onair_core::error::PublishError;
use onair_core::voice::VoiceSink;

/// Writes spoken audio to a fixed file the production tool plays from.
///
/// The file is replaced by rename so the player never reads a half-written
/// payload.
#[derive(Debug, Clone)]
pub struct FileVoiceSink {
    path: PathBuf,
}

impl FileVoiceSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The voice file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".partial");
        PathBuf::from(staging)
    }
}

#[async_trait]
impl VoiceSink for FileVoiceSink {
    async fn publish(&self, audio: &[u8]) -> Result<(), PublishError> {
        let staging = self.staging_path();
        tokio::fs::write(&staging, audio).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}
