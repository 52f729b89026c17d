//! JSON file implementation of the `NarrativeStore` trait.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use onair_core::error::StoreError;
use onair_core::store::{NarrativeState, NarrativeStore};

/// Keeps the narrative record in a small pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileNarrativeStore {
    path: PathBuf,
}

impl JsonFileNarrativeStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl NarrativeStore for JsonFileNarrativeStore {
    async fn load(&self) -> Result<NarrativeState, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(NarrativeState::default()),
            Err(e) => return Err(e.into()),
        };
        let state: NarrativeState =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if !state.is_valid() {
            return Err(StoreError::Corrupt(format!(
                "chapter must be at least 1, found {}",
                state.chapter
            )));
        }
        Ok(state)
    }

    async fn save(&self, state: NarrativeState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut body =
            serde_json::to_vec_pretty(&state).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        body.push(b'\n');

        let mut staging = self.path.clone().into_os_string();
        staging.push(".partial");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use onair_core::error::StoreError;
    use onair_core::store::{NarrativeState, NarrativeStore};

    use super::JsonFileNarrativeStore;

    #[tokio::test]
    async fn test_missing_record_loads_default_state() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileNarrativeStore::new(dir.path().join("state.json"));

        // Act
        let state = store.load().await.unwrap();

        // Assert
        assert_eq!(state, NarrativeState::default());
    }

    #[tokio::test]
    async fn test_saved_chapter_survives_a_new_store_instance() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("state.json");
        JsonFileNarrativeStore::new(&path)
            .save(NarrativeState { chapter: 9 })
            .await
            .unwrap();

        // Act: a fresh instance stands in for a restarted process.
        let reloaded = JsonFileNarrativeStore::new(&path).load().await.unwrap();

        // Assert
        assert_eq!(reloaded.chapter, 9);
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, "{\n  \"chapter\": 9\n}\n");
    }

    #[tokio::test]
    async fn test_unparseable_record_is_reported_corrupt() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, b"{ chapter: ").await.unwrap();

        // Act
        let result = JsonFileNarrativeStore::new(&path).load().await;

        // Assert
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_chapter_zero_is_reported_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, br#"{"chapter": 0}"#).await.unwrap();

        let result = JsonFileNarrativeStore::new(&path).load().await;

        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
