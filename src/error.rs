//! Error types for document ingestion.
//!
//! Detection, extraction and chunking return [`IngestError`]. The
//! orchestration layer wraps these in `anyhow` with path context.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::FileType;

/// Errors raised by the ingestion stages.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file name does not end in a supported extension.
    #[error("Unsupported file type")]
    UnsupportedFileType(PathBuf),

    /// Reading the file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content could not be parsed as its declared format.
    #[error("failed to parse {format} document: {message}")]
    Parse { format: FileType, message: String },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IngestError {
    pub(crate) fn parse(format: FileType, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }
}

/// Result alias for the ingestion stages.
pub type Result<T> = std::result::Result<T, IngestError>;
