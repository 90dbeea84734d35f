//! study-ingest: document ingestion for study material
//!
//! Detects the type of an uploaded PDF, DOCX or TXT file, extracts and
//! cleans its text, collects metadata, splits it into bounded chunks with
//! extractive summaries, and embeds each chunk.

pub mod chunking;
pub mod clean;
pub mod config;
pub mod detect;
pub mod embed;
pub mod error;
pub mod extract;
pub mod metadata;
pub mod pipeline;
pub mod summary;
pub mod types;

pub use chunking::{chunk_text, ChunkPolicy, Chunker, FixedSizeChunker, SentenceChunker, TextChunk, DEFAULT_CHUNK_SIZE};
pub use clean::clean_text;
pub use config::{Config, DevicePreference, EmbeddingBackend, EmbeddingModel};
pub use detect::detect_file_type;
pub use embed::{build_provider, embed_all, CandleEmbedder, EmbeddingProvider, OpenAiEmbedder};
pub use error::{IngestError, Result};
pub use extract::{extractor_for, DocumentExtractor, DocumentProperties, ExtractedDocument};
pub use metadata::{extract_metadata, DocumentMetadata};
pub use pipeline::{IngestPipeline, IngestReport, JsonlWriter, PathFilter, ProgressTracker, WriteStats};
pub use summary::extractive_summary;
pub use types::{FileType, ProcessedChunk, ProcessedDocument};
