//! Document extractors
//!
//! One [`DocumentExtractor`] per supported format. Extractors only pull raw
//! text and document properties; cleaning happens afterwards in
//! [`crate::clean`].

mod docx;
mod pdf;
mod txt;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use txt::TxtExtractor;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::types::FileType;

/// Properties embedded in the document itself. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    /// Creation date as recorded by the authoring tool
    pub created: Option<String>,
    pub page_count: Option<usize>,
}

/// Raw extraction output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub properties: DocumentProperties,
}

/// Trait for per-format text extraction
pub trait DocumentExtractor: Send + Sync {
    /// Format handled by this extractor
    fn file_type(&self) -> FileType;

    /// Extract text and properties from file content
    fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractedDocument>;

    /// Read `path` and extract it
    fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_bytes(&bytes)
    }
}

/// Get the extractor for a file type
pub fn extractor_for(file_type: FileType) -> Box<dyn DocumentExtractor> {
    match file_type {
        FileType::Pdf => Box::new(PdfExtractor::new()),
        FileType::Docx => Box::new(DocxExtractor::new()),
        FileType::Txt => Box::new(TxtExtractor::new()),
    }
}

/// Drop blank strings
pub(crate) fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_for_each_type() {
        for file_type in FileType::all() {
            assert_eq!(extractor_for(file_type).file_type(), file_type);
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = extractor_for(FileType::Txt)
            .extract(Path::new("/definitely/not/here.txt"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  Title "), Some("Title".to_string()));
        assert_eq!(non_blank(" \n "), None);
    }
}
