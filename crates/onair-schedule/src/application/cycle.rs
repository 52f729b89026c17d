//! The program cycle: Open, then Narrative, then Music.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use onair_control::application::arbiter::ControlArbiter;
use onair_control::domain::source::{SetOutcome, SourceKey};
use onair_core::error::{ControlPlaneError, GenerationError};
use onair_core::generation::TextGenerator;
use onair_core::store::NarrativeStore;
use onair_narrative::application::block::handle_narrative_block;
use onair_speech::channel::{SpeechChannel, SpeechError};
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::program::{CycleReport, Program};
use crate::domain::open::open_request;

/// Why the open block did not air.
#[derive(Debug, Error)]
pub enum OpenBlockError {
    /// The opening could not be generated.
    #[error("opening generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The opening could not be spoken.
    #[error("opening speech failed: {0}")]
    Speech(#[from] SpeechError),
}

/// The station's scheduled programming.
pub struct ProgramCycle {
    generator: Arc<dyn TextGenerator>,
    speech: SpeechChannel,
    store: Arc<dyn NarrativeStore>,
    arbiter: Arc<ControlArbiter>,
    music: SourceKey,
    music_window: Duration,
}

impl ProgramCycle {
    /// Assembles the cycle from its collaborators.
    #[must_use]
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        speech: SpeechChannel,
        store: Arc<dyn NarrativeStore>,
        arbiter: Arc<ControlArbiter>,
        music: SourceKey,
        music_window: Duration,
    ) -> Self {
        Self {
            generator,
            speech,
            store,
            arbiter,
            music,
            music_window,
        }
    }

    /// Generates a short intro and speaks it.
    ///
    /// # Errors
    ///
    /// Returns `OpenBlockError` when generation or speech fails.
    pub async fn open_block(&self) -> Result<(), OpenBlockError> {
        let script = self.generator.generate(&open_request()).await?;
        self.speech.submit(script).await?;
        info!("opening aired");
        Ok(())
    }

    /// Opens the music window. A missing music source is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `ControlPlaneError` when the control plane call fails.
    pub async fn music_block(&self) -> Result<SetOutcome, ControlPlaneError> {
        let outcome = self
            .arbiter
            .open_window(&self.music, self.music_window)
            .await?;
        if outcome == SetOutcome::SourceMissing {
            warn!(source = %self.music, "music source not found, window skipped");
        }
        Ok(outcome)
    }

    async fn cycle_body(&self, cycle_id: Uuid) -> CycleReport {
        let opened = match self.open_block().await {
            Ok(()) => true,
            Err(e) => {
                warn!(block = "open", error = %e, "block failed");
                false
            }
        };

        let chapter = match handle_narrative_block(
            self.generator.as_ref(),
            &self.speech,
            self.store.as_ref(),
        )
        .await
        {
            Ok(chapter) => Some(chapter),
            Err(e) => {
                warn!(block = "narrative", error = %e, "block failed");
                None
            }
        };

        let music = match self.music_block().await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(block = "music", error = %e, "block failed");
                None
            }
        };

        CycleReport {
            cycle_id,
            opened,
            chapter,
            music,
        }
    }
}

#[async_trait]
impl Program for ProgramCycle {
    async fn run_cycle(&self) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        let report = self
            .cycle_body(cycle_id)
            .instrument(info_span!("cycle", %cycle_id))
            .await;
        info!(
            %cycle_id,
            opened = report.opened,
            chapter = ?report.chapter,
            music = ?report.music,
            "cycle finished"
        );
        report
    }

    async fn welcome(&self) -> bool {
        let result = self
            .open_block()
            .instrument(info_span!("welcome"))
            .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(block = "welcome", error = %e, "block failed");
                false
            }
        }
    }
}
