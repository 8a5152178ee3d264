//! Google Cloud text-to-speech provider
//!
//! Uses the REST `text:synthesize` endpoint with an API key. The response
//! carries the audio as a base64 string inside a JSON body.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

const GOOGLE_SYNTHESIZE_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const LANGUAGE_CODE: &str = "en-US";

/// Provider for the Google Cloud text-to-speech API
#[derive(Debug)]
pub struct GoogleProvider {
    voice: String,
    api_key: String,
    client: Client,
}

impl GoogleProvider {
    /// Create a new Google provider with a fixed voice.
    pub fn new(voice: &str, api_key: String) -> Self {
        Self {
            voice: voice.to_string(),
            api_key,
            client: Client::new(),
        }
    }
}

// Google API request/response types

#[derive(Debug, Serialize)]
struct SynthesizeRequest {
    input: SynthesisInput,
    voice: VoiceSelection,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput {
    text: String,
}

#[derive(Debug, Serialize)]
struct VoiceSelection {
    #[serde(rename = "languageCode")]
    language_code: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: String,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
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
impl SpeechProvider for GoogleProvider {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let api_request = SynthesizeRequest {
            input: SynthesisInput {
                text: text.to_string(),
            },
            voice: VoiceSelection {
                language_code: LANGUAGE_CODE.to_string(),
                name: self.voice.clone(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3".to_string(),
            },
        };

        let response = self
            .client
            .post(GOOGLE_SYNTHESIZE_URL)
            .query(&[("key", &self.api_key)])
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
            if status.as_u16() == 429 {
                return Err(SpeechError::RateLimited { retry_after: None });
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

        let api_response: SynthesizeResponse =
            response.json().await.map_err(|e| SpeechError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        base64::engine::general_purpose::STANDARD
            .decode(&api_response.audio_content)
            .map_err(|e| SpeechError::ApiError {
                message: format!("Failed to decode audio content: {}", e),
                status_code: None,
            })
    }

    fn name(&self) -> &'static str {
        "Google TTS"
    }

    fn voice(&self) -> &str {
        &self.voice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let request = SynthesizeRequest {
            input: SynthesisInput {
                text: "Hello.".to_string(),
            },
            voice: VoiceSelection {
                language_code: LANGUAGE_CODE.to_string(),
                name: "en-US-Neural2-F".to_string(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3".to_string(),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"languageCode\":\"en-US\""));
        assert!(json.contains("\"audioConfig\""));
        assert!(json.contains("\"audioEncoding\":\"MP3\""));
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{"audioContent":"SUQz"}"#;
        let parsed: SynthesizeResponse = serde_json::from_str(body).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&parsed.audio_content)
            .unwrap();
        assert_eq!(decoded, b"ID3");
    }
}
