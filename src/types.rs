//! Shared types for the ingestion pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::DocumentMetadata;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
}

impl FileType {
    /// Label used in metadata and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }

    /// File name suffix that maps to this type
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Docx => ".docx",
            Self::Txt => ".txt",
        }
    }

    /// Get all supported types
    pub fn all() -> [Self; 3] {
        [Self::Pdf, Self::Docx, Self::Txt]
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chunk of a processed document, ready for downstream study features.
///
/// This is the JSONL output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedChunk {
    /// Identifier of the upload or collection the document belongs to
    pub source_id: String,
    /// Zero-based position of this chunk within its document
    pub index: usize,
    pub title: String,
    /// Extractive summary of `content`
    pub summary: String,
    pub content: String,
    /// Document metadata plus chunk position fields
    pub metadata: BTreeMap<String, String>,
    /// Empty when embeddings are disabled
    pub embedding: Vec<f32>,
}

/// All chunks produced from a single file.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub source_id: String,
    pub metadata: DocumentMetadata,
    pub chunks: Vec<ProcessedChunk>,
}

impl ProcessedDocument {
    /// Whether every chunk carries an embedding
    pub fn is_embedded(&self) -> bool {
        !self.chunks.is_empty() && self.chunks.iter().all(|c| !c.embedding.is_empty())
    }
}
