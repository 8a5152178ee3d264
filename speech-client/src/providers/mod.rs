//! Speech service implementations

mod azure;
mod google;
pub mod mock;
mod openai;

pub use azure::AzureProvider;
pub use google::GoogleProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

/// Supported speech services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Google,
    Azure,
}

impl ProviderKind {
    /// Parse service kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "open-ai" => Ok(Self::OpenAi),
            "google" | "gcp" => Ok(Self::Google),
            "azure" => Ok(Self::Azure),
            _ => Err(SpeechError::UnknownService(s.to_string())),
        }
    }

    /// Get the environment variable name for this service's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
            Self::Azure => "SPEECH_KEY",
        }
    }

    /// Display name for error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Google => "Google",
            Self::Azure => "Azure",
        }
    }

    /// Short voice aliases and the backend voice identifier each maps to.
    ///
    /// OpenAI voice names are already short and map to themselves.
    pub fn voices(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::OpenAi => &[
                ("alloy", "alloy"),
                ("echo", "echo"),
                ("fable", "fable"),
                ("onyx", "onyx"),
                ("nova", "nova"),
                ("shimmer", "shimmer"),
            ],
            Self::Google => &[
                ("amber", "en-US-Neural2-F"),
                ("orion", "en-US-Neural2-D"),
                ("journey", "en-US-Journey-F"),
                ("studio", "en-US-Studio-O"),
            ],
            Self::Azure => &[
                ("jenny", "en-US-JennyNeural"),
                ("guy", "en-US-GuyNeural"),
                ("aria", "en-US-AriaNeural"),
                ("davis", "en-US-DavisNeural"),
            ],
        }
    }

    /// Default voice alias for this service
    pub fn default_voice(&self) -> &'static str {
        match self {
            Self::OpenAi => "alloy",
            Self::Google => "amber",
            Self::Azure => "jenny",
        }
    }

    /// Resolve a user-facing voice alias to the backend voice identifier.
    ///
    /// An unrecognized alias is a configuration error, surfaced before any
    /// synthesis call is attempted.
    pub fn resolve_voice(&self, alias: &str) -> Result<&'static str> {
        let alias_lower = alias.to_lowercase();
        self.voices()
            .iter()
            .find(|(a, _)| *a == alias_lower)
            .map(|(_, id)| *id)
            .ok_or_else(|| SpeechError::InvalidVoice {
                provider: self.display_name().to_string(),
                voice: alias.to_string(),
                known: self
                    .voices()
                    .iter()
                    .map(|(a, _)| *a)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Create a provider instance for the given service and voice alias.
///
/// Validates the voice alias and credentials up front; `instructions` is a
/// natural-language reading guide honored by services that accept one.
pub fn get_provider(
    service: &str,
    voice: &str,
    instructions: Option<String>,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn SpeechProvider>> {
    let kind = ProviderKind::from_str(service)?;
    let voice_id = kind.resolve_voice(voice)?;

    match kind {
        ProviderKind::OpenAi => {
            let api_key = get_api_key(provider_config, kind)?;
            Ok(Box::new(OpenAiProvider::new(voice_id, api_key, instructions)))
        }
        ProviderKind::Google => {
            let api_key = get_api_key(provider_config, kind)?;
            Ok(Box::new(GoogleProvider::new(voice_id, api_key)))
        }
        ProviderKind::Azure => {
            let api_key = get_api_key(provider_config, kind)?;
            let region = provider_config
                .and_then(|c| c.region.clone())
                .or_else(|| std::env::var("SPEECH_REGION").ok())
                .ok_or_else(|| SpeechError::MissingApiKey {
                    provider: "Azure".to_string(),
                    env_var: "SPEECH_REGION".to_string(),
                })?;
            Ok(Box::new(AzureProvider::new(voice_id, api_key, region)))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(config: Option<&ProviderConfig>, kind: ProviderKind) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(kind.env_var()).map_err(|_| SpeechError::MissingApiKey {
        provider: kind.display_name().to_string(),
        env_var: kind.env_var().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(ProviderKind::from_str("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::from_str("Google").unwrap(), ProviderKind::Google);
        assert_eq!(ProviderKind::from_str("AZURE").unwrap(), ProviderKind::Azure);
    }

    #[test]
    fn test_kind_from_str_unknown() {
        let err = ProviderKind::from_str("polly").unwrap_err();
        assert!(matches!(err, SpeechError::UnknownService(_)));
    }

    #[test]
    fn test_resolve_voice() {
        assert_eq!(ProviderKind::OpenAi.resolve_voice("alloy").unwrap(), "alloy");
        assert_eq!(
            ProviderKind::Azure.resolve_voice("jenny").unwrap(),
            "en-US-JennyNeural"
        );
        assert_eq!(
            ProviderKind::Google.resolve_voice("Amber").unwrap(),
            "en-US-Neural2-F"
        );
    }

    #[test]
    fn test_resolve_voice_invalid() {
        let err = ProviderKind::OpenAi.resolve_voice("xyz").unwrap_err();
        match err {
            SpeechError::InvalidVoice { voice, known, .. } => {
                assert_eq!(voice, "xyz");
                assert!(known.contains("alloy"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_get_provider_invalid_voice_fails_before_construction() {
        let config = ProviderConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let err = get_provider("openai", "xyz", None, Some(&config)).unwrap_err();
        assert!(matches!(err, SpeechError::InvalidVoice { .. }));
    }

    #[test]
    fn test_get_provider_missing_azure_region() {
        // Config carries a key but no region, and the env var is not relied on here.
        let config = ProviderConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        if std::env::var("SPEECH_REGION").is_ok() {
            return; // environment already provides a region
        }
        let err = get_provider("azure", "jenny", None, Some(&config)).unwrap_err();
        assert!(matches!(err, SpeechError::MissingApiKey { .. }));
    }

    #[test]
    fn test_default_voices_resolve() {
        for kind in [ProviderKind::OpenAi, ProviderKind::Google, ProviderKind::Azure] {
            assert!(kind.resolve_voice(kind.default_voice()).is_ok());
        }
    }
}
