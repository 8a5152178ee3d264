//! Mock speech provider for testing
//!
//! Provides a configurable mock provider that can simulate failures and
//! count synthesis calls, which is how pipeline tests verify that resumed
//! runs issue no backend traffic.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

/// A mock provider for testing pipeline and resume behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count (plain and SSML calls combined)
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<SpeechError>>,
    /// Audio bytes to return on success
    audio: Vec<u8>,
    /// Whether this mock advertises SSML support
    ssml: bool,
}

impl MockProvider {
    /// Create a provider that always succeeds with the given audio bytes
    pub fn always_succeeds(audio: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            audio: audio.to_vec(),
            ssml: false,
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: SpeechError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            audio: Vec::new(),
            ssml: false,
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: SpeechError, audio: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            audio: audio.to_vec(),
            ssml: false,
        }
    }

    /// Advertise SSML support
    pub fn with_ssml(mut self) -> Self {
        self.ssml = true;
        self
    }

    /// Get the number of synthesis calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_result(&self) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let fail_count = self.fail_count.load(Ordering::SeqCst);

        if call_num < fail_count {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(self.audio.clone())
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        self.next_result()
    }

    async fn synthesize_ssml(&self, _ssml: &str) -> Result<Vec<u8>> {
        if !self.ssml {
            return Err(SpeechError::SsmlUnsupported {
                provider: self.name().to_string(),
            });
        }
        self.next_result()
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn voice(&self) -> &str {
        "mock-voice"
    }

    fn supports_ssml(&self) -> bool {
        self.ssml
    }
}

/// Clone a SpeechError (needed because SpeechError doesn't implement Clone)
fn clone_error(err: &SpeechError) -> SpeechError {
    match err {
        SpeechError::MissingApiKey { provider, env_var } => SpeechError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        SpeechError::UnknownService(s) => SpeechError::UnknownService(s.clone()),
        SpeechError::InvalidVoice {
            provider,
            voice,
            known,
        } => SpeechError::InvalidVoice {
            provider: provider.clone(),
            voice: voice.clone(),
            known: known.clone(),
        },
        SpeechError::SsmlUnsupported { provider } => SpeechError::SsmlUnsupported {
            provider: provider.clone(),
        },
        SpeechError::RateLimited { retry_after } => SpeechError::RateLimited {
            retry_after: *retry_after,
        },
        SpeechError::ApiError {
            message,
            status_code,
        } => SpeechError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        SpeechError::ConfigError(s) => SpeechError::ConfigError(s.clone()),
        // For Io and Toml errors, a generic error stands in since they can't be cloned
        SpeechError::Io(_) => SpeechError::ConfigError("IO error (mock)".to_string()),
        SpeechError::TomlParse(_) => SpeechError::ConfigError("TOML parse error (mock)".to_string()),
        SpeechError::TomlSerialize(_) => {
            SpeechError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}
