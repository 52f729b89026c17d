//! The narrative block: load, generate, speak, then advance.

use onair_core::error::{GenerationError, StoreError};
use onair_core::generation::TextGenerator;
use onair_core::store::{NarrativeState, NarrativeStore};
use onair_speech::channel::{SpeechChannel, SpeechError};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::script::chapter_request;

/// Why a narrative block did not advance the chapter.
#[derive(Debug, Error)]
pub enum NarrativeBlockError {
    /// The chapter script could not be generated.
    #[error("chapter generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The chapter could not be put on air.
    #[error("chapter speech failed: {0}")]
    Speech(#[from] SpeechError),

    /// The chapter aired but the advanced counter could not be saved.
    #[error("chapter counter not saved: {0}")]
    Store(#[from] StoreError),
}

/// Runs one narrative block and returns the chapter that went on air.
///
/// The counter advances by exactly one, and only after the speech channel
/// confirms the chapter was published. Any earlier failure leaves it
/// untouched so the next attempt reproduces the same chapter number.
///
/// An unreadable record falls back to the default initial state.
///
/// # Errors
///
/// Returns `NarrativeBlockError` for generation, speech or persistence
/// failures.
pub async fn handle_narrative_block(
    generator: &dyn TextGenerator,
    speech: &SpeechChannel,
    store: &dyn NarrativeStore,
) -> Result<u32, NarrativeBlockError> {
    let state = match store.load().await {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "narrative record unreadable, starting from the initial state");
            NarrativeState::default()
        }
    };
    let chapter = state.chapter;
    info!(chapter, "narrating chapter");

    let script = generator.generate(&chapter_request(chapter)).await?;
    speech.submit(script).await?;

    store.save(state.advanced()).await?;
    info!(chapter, next = chapter + 1, "chapter aired");
    Ok(chapter)
}
