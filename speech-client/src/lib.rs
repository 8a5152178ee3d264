//! Shared speech synthesis client library for the bookvoice workspace
//!
//! Provides a unified interface for multiple text-to-speech services:
//! - OpenAI (audio/speech API, natural-language reading instructions)
//! - Google Cloud (REST text:synthesize)
//! - Azure Cognitive Services (region-scoped SSML endpoint)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Config, ProviderConfig};
pub use error::{Result, SpeechError};
pub use provider::{SpeechProvider, escape_xml, ssml_envelope, text_to_ssml};
pub use providers::{MockProvider, ProviderKind, get_provider};
