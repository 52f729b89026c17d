//! Test narrative stores.

use std::sync::Mutex;

use async_trait::async_trait;
use onair_core::error::StoreError;
use onair_core::store::{NarrativeState, NarrativeStore};

/// A store that keeps the record in memory and counts saves.
#[derive(Debug, Default)]
pub struct InMemoryNarrativeStore {
    state: Mutex<Option<NarrativeState>>,
    saves: Mutex<usize>,
}

impl InMemoryNarrativeStore {
    /// Create a store holding `state`.
    #[must_use]
    pub fn with_state(state: NarrativeState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: Mutex::new(0),
        }
    }

    /// The currently stored record, or `None` if never written.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn current(&self) -> Option<NarrativeState> {
        *self.state.lock().unwrap()
    }

    /// Number of successful saves.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl NarrativeStore for InMemoryNarrativeStore {
    async fn load(&self) -> Result<NarrativeState, StoreError> {
        Ok(self.state.lock().unwrap().unwrap_or_default())
    }

    async fn save(&self, state: NarrativeState) -> Result<(), StoreError> {
        *self.state.lock().unwrap() = Some(state);
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// A store whose every operation fails with an I/O error.
#[derive(Debug)]
pub struct FailingNarrativeStore;

#[async_trait]
impl NarrativeStore for FailingNarrativeStore {
    async fn load(&self) -> Result<NarrativeState, StoreError> {
        Err(StoreError::Io(std::io::Error::other("read-only filesystem")))
    }

    async fn save(&self, _state: NarrativeState) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("read-only filesystem")))
    }
}
