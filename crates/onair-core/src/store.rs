//! Narrative continuity record and its persistence port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Durable chapter counter for the serialized fiction block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeState {
    /// Next chapter to narrate. Always at least 1.
    pub chapter: u32,
}

impl Default for NarrativeState {
    fn default() -> Self {
        Self { chapter: 1 }
    }
}

impl NarrativeState {
    /// The state after one chapter has been published.
    #[must_use]
    pub fn advanced(self) -> Self {
        Self {
            chapter: self.chapter.saturating_add(1),
        }
    }

    /// Whether the record satisfies the `chapter >= 1` invariant.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.chapter >= 1
    }
}

/// Reads and writes the narrative record.
#[async_trait]
pub trait NarrativeStore: Send + Sync {
    /// Loads the record.
    ///
    /// A missing record is not an error: implementations return the default
    /// state.
    async fn load(&self) -> Result<NarrativeState, StoreError>;

    /// Persists the record.
    async fn save(&self, state: NarrativeState) -> Result<(), StoreError>;
}
