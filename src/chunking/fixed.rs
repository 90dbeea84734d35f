//! Fixed-size chunker
//!
//! Places a boundary every `chunk_size` chars with no regard for words or
//! sentences. Trailing whitespace of the text is dropped before slicing, so
//! the final chunk comes out trimmed; non-final chunks are emitted verbatim.

use super::{Chunker, TextChunk, DEFAULT_CHUNK_SIZE};

/// Raw offset chunker
pub struct FixedSizeChunker {
    chunk_size: usize,
}

impl FixedSizeChunker {
    /// A `chunk_size` of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let body = text.trim_end();

        // Byte offset of every chunk start
        let starts: Vec<usize> = body
            .char_indices()
            .map(|(i, _)| i)
            .step_by(self.chunk_size)
            .collect();
        let total_chars = body.chars().count();

        let mut chunks = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let char_start = i * self.chunk_size;

            match starts.get(i + 1) {
                Some(&end) => chunks.push(TextChunk {
                    index: i,
                    content: body[start..end].to_string(),
                    char_start,
                    char_end: char_start + self.chunk_size,
                }),
                None => {
                    let piece = &body[start..];
                    let trimmed = piece.trim_start();
                    let char_start = char_start + (piece.chars().count() - trimmed.chars().count());
                    chunks.push(TextChunk {
                        index: i,
                        content: trimmed.to_string(),
                        char_start,
                        char_end: total_chars,
                    });
                }
            }
        }

        chunks
    }

    fn max_chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_empty_content() {
        let chunker = FixedSizeChunker::new(10);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_twelve_thousand_chars() {
        let chunker = FixedSizeChunker::default();
        let text = "x".repeat(12_000);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].char_len(), 5000);
        assert_eq!(chunks[1].char_len(), 5000);
        assert_eq!(chunks[2].char_len(), 2000);
        assert_eq!(chunks[2].char_start, 10_000);
        assert_eq!(chunks[2].char_end, 12_000);
    }

    #[test]
    fn test_chunk_count_and_bound() {
        let text: String = (0..997).map(|i| if i % 7 == 0 { ' ' } else { 'a' }).collect::<String>() + "z";
        let size = 100;
        let chunks = FixedSizeChunker::new(size).chunk(&text);

        let len = text.chars().count();
        assert_eq!(chunks.len(), len.div_ceil(size));
        assert!(chunks.iter().all(|c| c.content.chars().count() <= size));
        assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
    }

    #[test]
    fn test_concatenation_reconstructs_text() {
        let text = "The quick brown fox jumps over the lazy dog.   ";
        let chunks = FixedSizeChunker::new(8).chunk(text);
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined, text.trim_end());
    }

    #[test]
    fn test_only_final_chunk_trimmed() {
        let chunks = FixedSizeChunker::new(3).chunk(" ab cd ");
        assert_eq!(contents(&chunks), vec![" ab", "cd"]);
        assert_eq!(chunks[1].char_start, 4);
        assert_eq!(chunks[1].char_end, 6);
    }

    #[test]
    fn test_whitespace_tail_dropped() {
        let chunks = FixedSizeChunker::new(3).chunk("abc   ");
        assert_eq!(contents(&chunks), vec!["abc"]);
    }

    #[test]
    fn test_multibyte_chars() {
        let text = "ééééé日本語";
        let chunks = FixedSizeChunker::new(3).chunk(text);
        assert_eq!(contents(&chunks), vec!["ééé", "éé日", "本語"]);
    }

    #[test]
    fn test_zero_size_clamped() {
        let chunker = FixedSizeChunker::new(0);
        assert_eq!(chunker.max_chunk_size(), 1);
        assert_eq!(contents(&chunker.chunk("abc")), vec!["a", "b", "c"]);
    }
}
