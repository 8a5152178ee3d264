//! OpenAI text-to-speech provider
//!
//! Direct HTTP implementation for the OpenAI audio/speech API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const OPENAI_TTS_MODEL: &str = "tts-1";

/// Provider for the OpenAI text-to-speech API
#[derive(Debug)]
pub struct OpenAiProvider {
    voice: String,
    api_key: String,
    instructions: Option<String>,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with a fixed voice and optional
    /// natural-language reading instructions.
    pub fn new(voice: &str, api_key: String, instructions: Option<String>) -> Self {
        Self {
            voice: voice.to_string(),
            api_key,
            instructions,
            client: Client::new(),
        }
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct SpeechRequest {
    model: String,
    voice: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl SpeechProvider for OpenAiProvider {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let api_request = SpeechRequest {
            model: OPENAI_TTS_MODEL.to_string(),
            voice: self.voice.clone(),
            input: text.to_string(),
            instructions: self.instructions.clone(),
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| SpeechError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            // 429 drives the caller's pacing decisions
            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(SpeechError::RateLimited { retry_after });
            }

            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(SpeechError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| SpeechError::ApiError {
            message: format!("Failed to read audio body: {}", e),
            status_code: None,
        })?;

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "OpenAI TTS"
    }

    fn voice(&self) -> &str {
        &self.voice
    }
}
