use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, SpeechError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service to use when no --service flag is provided
    #[serde(default = "default_service")]
    pub default_service: String,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_service() -> String {
    "openai".to_string()
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Service region (Azure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Default voice alias for this provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| SpeechError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/bookvoice/speech.toml"))
    }

    /// Get provider config by service name
    pub fn get_provider_config(&self, service: &str) -> Option<&ProviderConfig> {
        self.providers.get(service)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_service: default_service(),
            providers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_service, "openai");
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_service, config.default_service);
    }

    #[test]
    fn test_parse_provider_config() {
        let toml_str = r#"
default_service = "azure"

[providers.azure]
api_key = "secret"
region = "westeurope"
voice = "jenny"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_service, "azure");
        let azure = config.get_provider_config("azure").unwrap();
        assert_eq!(azure.api_key.as_deref(), Some("secret"));
        assert_eq!(azure.region.as_deref(), Some("westeurope"));
        assert_eq!(azure.voice.as_deref(), Some("jenny"));
        assert!(config.get_provider_config("openai").is_none());
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(
            path.to_string_lossy()
                .contains(".config/bookvoice/speech.toml")
        );
    }
}
