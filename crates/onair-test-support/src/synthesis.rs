//! Test speech synthesizer.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use onair_core::error::SynthesisError;
use onair_core::synthesis::{SpeechSynthesizer, SynthesisRequest};

/// A synthesizer that records every text and returns its UTF-8 bytes as the
/// "audio". Can be configured to fail or to take time.
#[derive(Debug, Default)]
pub struct RecordingSynthesizer {
    fail: bool,
    delay: Option<Duration>,
    texts: Mutex<Vec<String>>,
}

impl RecordingSynthesizer {
    /// Create a synthesizer that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a synthesizer that records the text and then fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sleep for `delay` inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every text synthesized so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        self.texts.lock().unwrap().push(request.text.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SynthesisError::Api {
                status: 503,
                message: "synthesis offline".into(),
            });
        }
        Ok(request.text.as_bytes().to_vec())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
