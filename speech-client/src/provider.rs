use async_trait::async_trait;

use crate::error::{Result, SpeechError};

/// Trait for speech synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync + std::fmt::Debug {
    /// Synthesize plain text into audio bytes (MP3)
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Synthesize an SSML document into audio bytes (MP3)
    ///
    /// Only providers that report `supports_ssml() == true` accept this;
    /// the rest reject the call before any network traffic.
    async fn synthesize_ssml(&self, _ssml: &str) -> Result<Vec<u8>> {
        Err(SpeechError::SsmlUnsupported {
            provider: self.name().to_string(),
        })
    }

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// The resolved voice identifier this provider was constructed with
    fn voice(&self) -> &str;

    /// Whether this provider accepts SSML input
    fn supports_ssml(&self) -> bool {
        false
    }
}

/// Escape the five XML special characters for use inside an SSML document.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap already-escaped SSML body content in a standard speak/voice envelope.
pub fn ssml_envelope(voice: &str, body: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{}'>{}</voice></speak>",
        voice, body
    )
}

/// Build an SSML document from plain text: escapes markup characters and
/// turns paragraph breaks into explicit pauses.
pub fn text_to_ssml(voice: &str, text: &str) -> String {
    let body = escape_xml(text).replace("\n\n", "<break strength=\"strong\"/>");
    ssml_envelope(voice, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_xml("\"quote\" 'tick'"), "&quot;quote&quot; &apos;tick&apos;");
        assert_eq!(escape_xml("plain text"), "plain text");
    }

    #[test]
    fn test_ssml_envelope_contains_voice() {
        let ssml = ssml_envelope("en-US-JennyNeural", "hello");
        assert!(ssml.contains("<voice name='en-US-JennyNeural'>hello</voice>"));
        assert!(ssml.starts_with("<speak"));
        assert!(ssml.ends_with("</speak>"));
    }

    #[test]
    fn test_text_to_ssml_breaks_paragraphs() {
        let ssml = text_to_ssml("v", "First paragraph.\n\nSecond & last.");
        assert!(ssml.contains("<break strength=\"strong\"/>"));
        assert!(ssml.contains("Second &amp; last."));
        assert!(!ssml.contains("\n\n"));
    }
}
