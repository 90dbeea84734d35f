//! Sentence-aware chunker
//!
//! Packs whole sentences into chunks up to the target size.
//! Falls back to word boundaries for oversized sentences, and to raw char
//! offsets only for a single word longer than the target.

use super::{Chunker, TextChunk, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};

/// Half-open char range `[start, end)` of a trimmed, non-empty span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Sentence-aware chunker with optional sentence overlap
pub struct SentenceChunker {
    target_size: usize,
    overlap: usize,
}

impl SentenceChunker {
    pub fn new() -> Self {
        Self::with_sizes(DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
    }

    /// Overlap is capped at half the target so every chunk advances.
    pub fn with_sizes(target_size: usize, overlap: usize) -> Self {
        let target_size = target_size.max(1);
        Self {
            target_size,
            overlap: overlap.min(target_size / 2),
        }
    }

    /// Split sentences that exceed the target into word-bounded pieces
    fn fit_units(&self, chars: &[char]) -> Vec<Span> {
        let mut units = Vec::new();
        for sentence in split_sentences(chars) {
            if sentence.len() <= self.target_size {
                units.push(sentence);
            } else {
                units.extend(self.split_words(chars, sentence));
            }
        }
        units
    }

    fn split_words(&self, chars: &[char], sentence: Span) -> Vec<Span> {
        let mut pieces = Vec::new();
        let mut current: Option<Span> = None;

        for word in words(chars, sentence) {
            if word.len() > self.target_size {
                if let Some(piece) = current.take() {
                    pieces.push(piece);
                }
                let mut start = word.start;
                while start < word.end {
                    let end = (start + self.target_size).min(word.end);
                    pieces.push(Span { start, end });
                    start = end;
                }
                continue;
            }

            current = match current {
                Some(piece) if word.end - piece.start <= self.target_size => Some(Span {
                    start: piece.start,
                    end: word.end,
                }),
                Some(piece) => {
                    pieces.push(piece);
                    Some(word)
                }
                None => Some(word),
            };
        }

        if let Some(piece) = current {
            pieces.push(piece);
        }
        pieces
    }

    /// First unit to carry from a finished chunk `[first, last]` into the next one
    fn overlap_start(&self, units: &[Span], first: usize, last: usize, next: Span) -> Option<usize> {
        if self.overlap == 0 {
            return None;
        }

        // Never carry the whole previous chunk
        let mut carry = None;
        let mut k = last;
        while k > first && units[last].end - units[k].start <= self.overlap {
            carry = Some(k);
            k -= 1;
        }

        let mut start = carry?;
        while start <= last && next.end - units[start].start > self.target_size {
            start += 1;
        }
        (start <= last).then_some(start)
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let units = self.fit_units(&chars);
        if units.is_empty() {
            return Vec::new();
        }

        // Char offset -> byte offset
        let mut byte_at: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        byte_at.push(text.len());

        let mut chunks = Vec::new();
        let mut emit = |first: Span, last: Span| {
            chunks.push(TextChunk {
                index: chunks.len(),
                content: text[byte_at[first.start]..byte_at[last.end]].to_string(),
                char_start: first.start,
                char_end: last.end,
            });
        };

        let mut first = 0;
        let mut last = 0;
        for (idx, unit) in units.iter().enumerate().skip(1) {
            if unit.end - units[first].start <= self.target_size {
                last = idx;
                continue;
            }

            emit(units[first], units[last]);
            first = self.overlap_start(&units, first, last, *unit).unwrap_or(idx);
            last = idx;
        }
        emit(units[first], units[last]);

        chunks
    }

    fn max_chunk_size(&self) -> usize {
        self.target_size
    }

    fn name(&self) -> &'static str {
        "sentence"
    }
}

/// Sentence spans as `(start, end)` char offsets, trimmed and non-empty.
///
/// A sentence ends after `.`, `!` or `?` (plus closing quotes or brackets)
/// followed by whitespace, or at a blank line.
pub(crate) fn sentence_spans(chars: &[char]) -> Vec<(usize, usize)> {
    split_sentences(chars)
        .into_iter()
        .map(|s| (s.start, s.end))
        .collect()
}

fn split_sentences(chars: &[char]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let boundary = match chars[i] {
            '.' | '!' | '?' => {
                let mut j = i + 1;
                while j < chars.len() && matches!(chars[j], '"' | '\'' | ')' | ']' | '”' | '’') {
                    j += 1;
                }
                (j == chars.len() || chars[j].is_whitespace()).then_some(j)
            }
            '\n' if is_blank_line_after(chars, i) => Some(i),
            _ => None,
        };

        match boundary {
            Some(end) => {
                push_trimmed(chars, start, end, &mut spans);
                start = end;
                i = end.max(i + 1);
            }
            None => i += 1,
        }
    }

    push_trimmed(chars, start, chars.len(), &mut spans);
    spans
}

/// Whether the newline at `i` is followed by an empty (or whitespace-only) line
fn is_blank_line_after(chars: &[char], i: usize) -> bool {
    chars[i + 1..]
        .iter()
        .take_while(|c| **c == '\n' || **c == ' ' || **c == '\t')
        .any(|c| *c == '\n')
}

fn push_trimmed(chars: &[char], mut start: usize, mut end: usize, spans: &mut Vec<Span>) {
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    if start < end {
        spans.push(Span { start, end });
    }
}

fn words(chars: &[char], within: Span) -> Vec<Span> {
    let mut words = Vec::new();
    let mut start = None;

    for i in within.start..within.end {
        match (chars[i].is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                words.push(Span { start: s, end: i });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(Span { start: s, end: within.end });
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_empty_content() {
        let chunker = SentenceChunker::new();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk(" \n\n ").is_empty());
    }

    #[test]
    fn test_packs_sentences() {
        let chunker = SentenceChunker::with_sizes(9, 0);
        let chunks = chunker.chunk("One. Two. Three.");
        assert_eq!(contents(&chunks), vec!["One. Two.", "Three."]);
    }

    #[test]
    fn test_decimal_point_is_not_a_boundary() {
        let chars: Vec<char> = "Pi is 3.14 roughly. Next one!".chars().collect();
        let spans = sentence_spans(&chars);
        assert_eq!(spans, vec![(0, 19), (20, 29)]);
    }

    #[test]
    fn test_paragraph_break_is_a_boundary() {
        let chunker = SentenceChunker::with_sizes(10, 0);
        let chunks = chunker.chunk("Heading\n\nBody text here");
        assert_eq!(contents(&chunks), vec!["Heading", "Body text", "here"]);
    }

    #[test]
    fn test_keeps_paragraphs_within_a_chunk() {
        let chunker = SentenceChunker::new();
        let text = "Heading\n\nBody text here.";
        let chunks = chunker.chunk(text);
        assert_eq!(contents(&chunks), vec![text]);
    }

    #[test]
    fn test_long_word_split() {
        let chunker = SentenceChunker::with_sizes(10, 0);
        let text = "a".repeat(25);
        let chunks = chunker.chunk(&text);
        let lengths: Vec<usize> = chunks.iter().map(|c| c.char_len()).collect();
        assert_eq!(lengths, vec![10, 10, 5]);
    }

    #[test]
    fn test_never_exceeds_target_or_splits_words() {
        let chunker = SentenceChunker::with_sizes(60, 0);
        let text = (1..=40)
            .map(|i| format!("Sentence number {} talks about cells and energy.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        let original: std::collections::HashSet<&str> = text.split_whitespace().collect();
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 60, "chunk too long: {:?}", chunk.content);
            assert_eq!(chunk.content, chunk.content.trim());
            for word in chunk.content.split_whitespace() {
                assert!(original.contains(word), "split word: {}", word);
            }
        }
    }

    #[test]
    fn test_offsets_point_into_source() {
        let chunker = SentenceChunker::with_sizes(30, 0);
        let text = "  Über alles. Café au lait is nice.\n\nNext paragraph here.  ";
        let chars: Vec<char> = text.chars().collect();

        for chunk in chunker.chunk(text) {
            let slice: String = chars[chunk.char_start..chunk.char_end].iter().collect();
            assert_eq!(slice, chunk.content);
        }
    }

    #[test]
    fn test_overlap_carries_trailing_sentence() {
        let chunker = SentenceChunker::with_sizes(22, 10);
        let chunks = chunker.chunk("Alpha one. Beta two. Gamma three. Delta four.");
        assert_eq!(
            contents(&chunks),
            vec!["Alpha one. Beta two.", "Beta two. Gamma three.", "Delta four."]
        );
        assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
    }

    #[test]
    fn test_overlap_capped() {
        let chunker = SentenceChunker::with_sizes(100, 500);
        assert_eq!(chunker.overlap, 50);
    }
}
