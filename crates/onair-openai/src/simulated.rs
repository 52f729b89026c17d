//! Offline providers used when no API key is configured.
//!
//! The station stays on the air with placeholder text and silent audio.

use async_trait::async_trait;
use onair_core::error::{GenerationError, SynthesisError};
use onair_core::generation::{GenerationRequest, TextGenerator};
use onair_core::synthesis::{SpeechSynthesizer, SynthesisRequest};

/// Echoes the prompt back as `Simulación: {prompt}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedTextGenerator;

#[async_trait]
impl TextGenerator for SimulatedTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(format!("Simulación: {}", request.user_prompt))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Produces an empty audio payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn synthesize(&self, _request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "silent"
    }
}
