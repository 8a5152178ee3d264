//! Size-bounded text chunking for synthesis requests.

use super::Chunk;

/// Default maximum chunk size in characters, matching the strictest input
/// limit among the supported synthesis services.
pub const DEFAULT_MAX_CHUNK: usize = 4096;

/// Sentence delimiter used for both splitting and reassembly.
const SENTENCE_DELIMITER: &str = ". ";

/// Split text into chunks no longer than `max_size`, without breaking
/// sentences.
///
/// Sentences are accumulated greedily; when the next sentence would push the
/// buffer past `max_size`, the buffer is flushed and a new one starts with
/// that sentence. A single sentence longer than `max_size` is emitted as one
/// oversized chunk rather than split mid-sentence. Empty or whitespace-only
/// input returns no chunks.
///
/// Joining the returned chunks with `". "` reproduces the input up to
/// whitespace trimming at each chunk boundary.
pub fn split_text(content: &str, max_size: usize) -> Vec<String> {
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Option<String> = None;

    for sentence in content.split(SENTENCE_DELIMITER) {
        current = Some(match current {
            None => sentence.to_string(),
            Some(mut buffer) => {
                if buffer.len() + SENTENCE_DELIMITER.len() + sentence.len() <= max_size {
                    buffer.push_str(SENTENCE_DELIMITER);
                    buffer.push_str(sentence);
                    buffer
                } else {
                    chunks.push(buffer.trim().to_string());
                    sentence.to_string()
                }
            }
        });
    }

    if let Some(buffer) = current {
        let trimmed = buffer.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
    }

    chunks
}

/// Split a section's text into indexed chunks.
pub fn chunk_section(content: &str, max_size: usize) -> Vec<Chunk> {
    split_text(content, max_size)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk::new(index, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("Hello world. How are you?", DEFAULT_MAX_CHUNK);
        assert_eq!(chunks, vec!["Hello world. How are you?"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(split_text("", DEFAULT_MAX_CHUNK).is_empty());
        assert!(split_text("   \n\n   ", DEFAULT_MAX_CHUNK).is_empty());
    }

    #[test]
    fn test_chunks_respect_max_size() {
        let text = "A. ".repeat(2000);
        let chunks = split_text(&text, DEFAULT_MAX_CHUNK);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() <= DEFAULT_MAX_CHUNK, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_sentences_never_split() {
        let text = "First sentence here. Second sentence here. Third sentence here";
        let chunks = split_text(&text, 30);
        assert_eq!(
            chunks,
            vec![
                "First sentence here",
                "Second sentence here",
                "Third sentence here"
            ]
        );
    }

    #[test]
    fn test_oversized_single_sentence_kept_whole() {
        let sentence = "x".repeat(100);
        let text = format!("Short one. {}. Another short one", sentence);
        let chunks = split_text(&text, 50);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].len(), 100);
    }

    #[test]
    fn test_round_trip() {
        let text = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten";
        let chunks = split_text(text, 20);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join(". "), text);
    }

    #[test]
    fn test_chunk_section_indices_contiguous() {
        let text = "First sentence here. Second sentence here. Third sentence here";
        let chunks = chunk_section(text, 30);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    proptest! {
        #[test]
        fn prop_chunks_within_bound_unless_single_sentence(
            sentences in proptest::collection::vec("[a-zA-Z ]{1,40}", 1..50),
            max_size in 10usize..200,
        ) {
            let text = sentences.join(". ");
            for chunk in split_text(&text, max_size) {
                if chunk.len() > max_size {
                    // only legal when the chunk is one undividable sentence
                    prop_assert!(!chunk.contains(". "));
                }
            }
        }

        #[test]
        fn prop_round_trip(
            sentences in proptest::collection::vec("[a-zA-Z,;:]{1,30}( [a-zA-Z,;:]{1,30}){0,5}", 1..30),
            max_size in 10usize..200,
        ) {
            let text = sentences.join(". ");
            let chunks = split_text(&text, max_size);
            prop_assert_eq!(chunks.join(". "), text.trim().to_string());
        }
    }
}
