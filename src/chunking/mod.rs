//! Chunking policies
//!
//! Splits cleaned document text into bounded-size pieces so downstream
//! model inputs stay within their limits. The boundary rule is a policy
//! object behind the [`Chunker`] trait:
//! - [`FixedSizeChunker`]: raw offsets every `chunk_size` chars
//! - [`SentenceChunker`]: packs whole sentences, never splits a word that fits
//!
//! Sizes are counted in chars (Unicode scalar values).

mod fixed;
mod sentence;

pub use fixed::FixedSizeChunker;
pub use sentence::SentenceChunker;
pub(crate) use sentence::sentence_spans;

use serde::{Deserialize, Serialize};

/// Default maximum chunk size in chars
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Default overlap between sentence chunks in chars
pub const DEFAULT_OVERLAP: usize = 0;

/// A piece of document text with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Zero-based sequence index
    pub index: usize,
    pub content: String,
    /// Char offset of the first char of `content` in the source text
    pub char_start: usize,
    /// Char offset one past the last char of `content`
    pub char_end: usize,
}

impl TextChunk {
    /// Length of the content in chars
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// Trait for chunk boundary policies
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks
    fn chunk(&self, text: &str) -> Vec<TextChunk>;

    /// Upper bound on the length of any produced chunk, in chars
    fn max_chunk_size(&self) -> usize;

    /// Policy name recorded in chunk metadata
    fn name(&self) -> &'static str;
}

/// Available chunk boundary policies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPolicy {
    /// Boundaries at fixed char offsets
    #[default]
    Fixed,
    /// Sentence-aware packing
    Sentence,
}

impl ChunkPolicy {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Sentence => "sentence",
        }
    }

    /// Build the chunker for this policy. `overlap` only applies to sentence chunking.
    pub fn build(self, chunk_size: usize, overlap: usize) -> Box<dyn Chunker> {
        match self {
            Self::Fixed => Box::new(FixedSizeChunker::new(chunk_size)),
            Self::Sentence => Box::new(SentenceChunker::with_sizes(chunk_size, overlap)),
        }
    }
}

/// Split `text` at fixed offsets of `chunk_size` chars.
///
/// Only the final chunk is trimmed. Empty input gives no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    FixedSizeChunker::new(chunk_size)
        .chunk(text)
        .into_iter()
        .map(|c| c.content)
        .collect()
}
