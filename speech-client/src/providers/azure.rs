//! Azure Cognitive Services speech provider
//!
//! Posts SSML to the region-scoped synthesis endpoint. Plain-text calls are
//! wrapped in a minimal SSML envelope; callers may also submit their own
//! SSML for prosody and pause control.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechProvider, escape_xml, ssml_envelope};

const OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";

/// Provider for the Azure Cognitive Services speech API
#[derive(Debug)]
pub struct AzureProvider {
    voice: String,
    api_key: String,
    region: String,
    client: Client,
}

impl AzureProvider {
    /// Create a new Azure provider with a fixed voice and service region.
    pub fn new(voice: &str, api_key: String, region: String) -> Self {
        Self {
            voice: voice.to_string(),
            api_key,
            region,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    async fn post_ssml(&self, ssml: String) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(ssml)
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

            let message = response.text().await.unwrap_or_default();
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
}

#[async_trait]
impl SpeechProvider for AzureProvider {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        // The endpoint only accepts SSML, so plain text gets an envelope.
        let ssml = ssml_envelope(&self.voice, &escape_xml(text));
        self.post_ssml(ssml).await
    }

    async fn synthesize_ssml(&self, ssml: &str) -> Result<Vec<u8>> {
        self.post_ssml(ssml.to_string()).await
    }

    fn name(&self) -> &'static str {
        "Azure Speech"
    }

    fn voice(&self) -> &str {
        &self.voice
    }

    fn supports_ssml(&self) -> bool {
        true
    }
}
