//! Speech synthesis port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;

/// Audio container requested from the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG layer 3.
    Mp3,
    /// Ogg Opus.
    Opus,
    /// Uncompressed PCM in a WAV container.
    Wav,
}

impl AudioFormat {
    /// The codec tag providers expect.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Wav => "wav",
        }
    }
}

/// A single synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak.
    pub text: String,
    /// Voice profile name.
    pub voice: String,
    /// Output codec.
    pub format: AudioFormat,
    /// Locale tag, e.g. `es`.
    pub language: String,
}

/// Turns text into raw audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes the request into encoded audio.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError>;

    /// Provider name, for logs.
    fn name(&self) -> &str;
}
