//! Chat completions provider.

use async_trait::async_trait;
use onair_core::error::GenerationError;
use onair_core::generation::{GenerationRequest, TextGenerator};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DEFAULT_BASE_URL, build_headers};

/// Text model used when none is configured.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat completions generator.
pub struct OpenAiTextGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiTextGenerator {
    /// Creates a generator for `model`.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Points the generator at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn to_api_request<'a>(&'a self, request: &'a GenerationRequest) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: [
                ApiMessage {
                    role: "system",
                    content: &request.system_directive,
                },
                ApiMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    content: Option<String>,
}

impl ApiResponse {
    /// Trimmed text of the first choice. An absent choice yields `""`.
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let headers = build_headers(&self.api_key)
            .map_err(|e| GenerationError::Parse(format!("invalid API key header: {e}")))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(headers)
            .json(&self.to_api_request(request))
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;
        let text = api_response.into_text();
        debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
