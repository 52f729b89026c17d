//! Test text generators.

use std::sync::Mutex;

use async_trait::async_trait;
use onair_core::error::GenerationError;
use onair_core::generation::{GenerationRequest, TextGenerator};

/// A generator that records every request and answers with a fixed reply.
#[derive(Debug)]
pub struct ScriptedTextGenerator {
    reply: String,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedTextGenerator {
    /// Create a generator that always answers `reply`.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A generator that always fails with a network error.
#[derive(Debug)]
pub struct FailingTextGenerator;

#[async_trait]
impl TextGenerator for FailingTextGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Network("connection refused".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
