//! Reading instructions and pronunciation hint configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Base reading instructions for services that accept a natural-language
/// guide alongside the text.
pub const BASE_INSTRUCTIONS: &str = "Read the text in a measured, audiobook narration style. \
     Do not vocalize markdown punctuation characters such as '#', '*' or '_'.";

#[derive(Debug, Deserialize)]
struct PronunciationFile {
    pronunciation: BTreeMap<String, String>,
}

/// Load a pronunciation hint file and render it as instruction lines.
///
/// The file is JSON with a top-level `pronunciation` object mapping terms to
/// phonetic guides:
///
/// ```json
/// {
///     "pronunciation": {
///         "GraphQL": "graph Q L",
///         "nginx": "engine ex"
///     }
/// }
/// ```
///
/// Any other shape (missing key, non-string values) is a configuration
/// error, reported before synthesis begins.
pub fn load_pronunciation_guide(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pronunciation config {}", path.display()))?;

    let parsed: PronunciationFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid pronunciation config {}", path.display()))?;

    let mut guide = String::from(
        "Pronunciation: please use the following as a guide to pronunciation of key terms. \
         For each of the following items, the string before the colon is the term, and the \
         string after the colon is the phonetic pronunciation:\n",
    );
    for (term, pronunciation) in &parsed.pronunciation {
        guide.push_str(&format!("{}: {}\n", term, pronunciation));
    }

    Ok(guide)
}

/// Assemble the full instruction string for the active service.
pub fn build_instructions(pronunciation_config: Option<&Path>) -> Result<String> {
    let mut instructions = BASE_INSTRUCTIONS.to_string();
    if let Some(path) = pronunciation_config {
        instructions.push('\n');
        instructions.push_str(&load_pronunciation_guide(path)?);
    }
    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("pronunciation.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_pronunciation_guide() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{"pronunciation": {"nginx": "engine ex", "GraphQL": "graph Q L"}}"#,
        );

        let guide = load_pronunciation_guide(&path).unwrap();
        assert!(guide.starts_with("Pronunciation:"));
        assert!(guide.contains("nginx: engine ex\n"));
        assert!(guide.contains("GraphQL: graph Q L\n"));
    }

    #[test]
    fn test_missing_pronunciation_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"glossary": {"a": "b"}}"#);
        assert!(load_pronunciation_guide(&path).is_err());
    }

    #[test]
    fn test_non_string_values_are_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"pronunciation": {"a": 3}}"#);
        assert!(load_pronunciation_guide(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_pronunciation_guide(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_build_instructions_without_hints() {
        let instructions = build_instructions(None).unwrap();
        assert_eq!(instructions, BASE_INSTRUCTIONS);
    }

    #[test]
    fn test_build_instructions_appends_hints() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"pronunciation": {"nginx": "engine ex"}}"#);

        let instructions = build_instructions(Some(&path)).unwrap();
        assert!(instructions.starts_with(BASE_INSTRUCTIONS));
        assert!(instructions.contains("nginx: engine ex"));
    }
}
