//! Audio speech provider.

use async_trait::async_trait;
use onair_core::error::SynthesisError;
use onair_core::synthesis::{SpeechSynthesizer, SynthesisRequest};
use serde::Serialize;
use tracing::debug;

use crate::{DEFAULT_BASE_URL, build_headers};

/// Voice model used when none is configured.
pub const DEFAULT_VOICE_MODEL: &str = "gpt-4o-mini-tts";

/// OpenAI `audio/speech` synthesizer.
pub struct OpenAiSynthesizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiSynthesizer {
    /// Creates a synthesizer for `model`.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Points the synthesizer at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn to_api_request<'a>(&'a self, request: &'a SynthesisRequest) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            voice: &request.voice,
            input: &request.text,
            response_format: request.format.as_str(),
            instructions: format!("Speak in the language with code '{}'.", request.language),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
    instructions: String,
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        let headers = build_headers(&self.api_key).map_err(|e| SynthesisError::Api {
            status: 401,
            message: format!("invalid API key header: {e}"),
        })?;

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .headers(headers)
            .json(&self.to_api_request(request))
            .send()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;
        debug!(model = %self.model, bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use onair_core::synthesis::AudioFormat;

    use super::*;

    #[test]
    fn test_request_body_names_voice_format_and_language() {
        // Arrange
        let synthesizer = OpenAiSynthesizer::new("sk-test", DEFAULT_VOICE_MODEL);
        let request = SynthesisRequest {
            text: "Buenas noches".into(),
            voice: "alloy".into(),
            format: AudioFormat::Mp3,
            language: "es".into(),
        };

        // Act
        let body = serde_json::to_value(synthesizer.to_api_request(&request)).unwrap();

        // Assert
        assert_eq!(body["model"], "gpt-4o-mini-tts");
        assert_eq!(body["voice"], "alloy");
        assert_eq!(body["input"], "Buenas noches");
        assert_eq!(body["response_format"], "mp3");
        assert!(body["instructions"].as_str().unwrap().contains("'es'"));
    }

    fn request() -> SynthesisRequest {
        SynthesisRequest {
            text: "Buenas noches".into(),
            voice: "alloy".into(),
            format: AudioFormat::Mp3,
            language: "es".into(),
        }
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio_bytes() {
        // Arrange
        let audio = vec![0xFF, 0xFB, 0x90, 0x00, 0x01, 0x02];
        let (base_url, server) =
            crate::canned::serve_once(200, "audio/mpeg", audio.clone(), None).await;
        let synthesizer =
            OpenAiSynthesizer::new("sk-test", DEFAULT_VOICE_MODEL).with_base_url(base_url);

        // Act
        let bytes = synthesizer.synthesize(&request()).await.unwrap();

        // Assert
        assert_eq!(bytes, audio);
        let received = server.await.unwrap();
        assert!(received.starts_with("POST /v1/audio/speech "));
        assert!(received.contains("\"voice\":\"alloy\""));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_api_error() {
        // Arrange
        let (base_url, _server) = crate::canned::serve_once(
            400,
            "application/json",
            br#"{"error":"bad voice"}"#.to_vec(),
            None,
        )
        .await;
        let synthesizer =
            OpenAiSynthesizer::new("sk-test", DEFAULT_VOICE_MODEL).with_base_url(base_url);

        // Act
        let result = synthesizer.synthesize(&request()).await;

        // Assert
        match result {
            Err(SynthesisError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("bad voice"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_truncated_audio_body_is_a_network_error() {
        // Arrange
        let (base_url, _server) =
            crate::canned::serve_once(200, "audio/mpeg", vec![0xFF, 0xFB], Some(64)).await;
        let synthesizer =
            OpenAiSynthesizer::new("sk-test", DEFAULT_VOICE_MODEL).with_base_url(base_url);

        // Act
        let result = synthesizer.synthesize(&request()).await;

        // Assert
        assert!(matches!(result, Err(SynthesisError::Network(_))), "{result:?}");
    }
}
