//! Text generation port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Sampling temperature used for every on-air script.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// A single text-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Persona and style directive.
    pub system_directive: String,
    /// The concrete ask.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl GenerationRequest {
    /// Creates a request with the default on-air temperature.
    #[must_use]
    pub fn new(system_directive: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_directive: system_directive.into(),
            user_prompt: user_prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Produces text from a prompt. Fallible and latency-bearing.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Provider name, for logs.
    fn name(&self) -> &str;
}
