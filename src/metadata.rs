//! Document metadata extraction.
//!
//! Combines properties embedded in the document with figures computed from
//! the cleaned text and the file on disk.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clean::word_count;
use crate::error::{IngestError, Result};
use crate::extract::{DocumentProperties, ExtractedDocument};
use crate::types::FileType;

/// Longest first line accepted as an inferred title
pub const MAX_INFERRED_TITLE_CHARS: usize = 120;

/// Metadata for one ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub file_name: String,
    pub file_type: FileType,
    pub file_size_bytes: u64,
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub created: Option<String>,
    pub page_count: Option<usize>,
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    /// md5 of the cleaned text
    pub content_hash: String,
    /// RFC 3339, UTC
    pub extracted_at: String,
}

impl DocumentMetadata {
    /// Build metadata from already-known file facts.
    pub fn build(
        file_name: &str,
        file_type: FileType,
        file_size_bytes: u64,
        properties: &DocumentProperties,
        cleaned: &str,
    ) -> Self {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        Self {
            document_id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            file_type,
            file_size_bytes,
            title: infer_title(properties.title.as_deref(), cleaned, &stem),
            author: properties.author.clone(),
            subject: properties.subject.clone(),
            created: properties.created.clone(),
            page_count: properties.page_count,
            char_count: cleaned.chars().count(),
            word_count: word_count(cleaned),
            line_count: cleaned.lines().count(),
            content_hash: format!("{:x}", md5::compute(cleaned.as_bytes())),
            extracted_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }

    /// Flatten into the string map carried by every chunk. Absent optional
    /// fields are omitted.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("document_id".to_string(), self.document_id.clone());
        map.insert("file_name".to_string(), self.file_name.clone());
        map.insert("file_type".to_string(), self.file_type.to_string());
        map.insert("file_size_bytes".to_string(), self.file_size_bytes.to_string());
        map.insert("document_title".to_string(), self.title.clone());
        map.insert("char_count".to_string(), self.char_count.to_string());
        map.insert("word_count".to_string(), self.word_count.to_string());
        map.insert("line_count".to_string(), self.line_count.to_string());
        map.insert("content_hash".to_string(), self.content_hash.clone());
        map.insert("extracted_at".to_string(), self.extracted_at.clone());

        let optional = [
            ("author", self.author.clone()),
            ("subject", self.subject.clone()),
            ("created", self.created.clone()),
            ("page_count", self.page_count.map(|n| n.to_string())),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
        map
    }
}

/// Extract metadata for a file that has already been extracted and cleaned.
pub fn extract_metadata(
    path: &Path,
    file_type: FileType,
    extracted: &ExtractedDocument,
    cleaned: &str,
) -> Result<DocumentMetadata> {
    let file_size = std::fs::metadata(path)
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(DocumentMetadata::build(
        &file_name,
        file_type,
        file_size,
        &extracted.properties,
        cleaned,
    ))
}

/// Pick a title: embedded property, then a short first line, then the file stem
pub fn infer_title(property: Option<&str>, cleaned: &str, file_stem: &str) -> String {
    if let Some(title) = property.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    cleaned
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.chars().count() <= MAX_INFERRED_TITLE_CHARS)
        .map(str::to_string)
        .unwrap_or_else(|| file_stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prefers_property() {
        assert_eq!(infer_title(Some(" Genetics "), "First line", "notes"), "Genetics");
    }

    #[test]
    fn test_title_falls_back_to_first_line() {
        assert_eq!(infer_title(Some("  "), "\n\nChapter 4: Enzymes\nBody", "notes"), "Chapter 4: Enzymes");
    }

    #[test]
    fn test_title_falls_back_to_stem() {
        let long_line = "word ".repeat(40);
        assert_eq!(infer_title(None, &long_line, "lecture-04"), "lecture-04");
        assert_eq!(infer_title(None, "", "lecture-04"), "lecture-04");
    }

    #[test]
    fn test_build_counts() {
        let properties = DocumentProperties {
            author: Some("A. Student".to_string()),
            page_count: Some(2),
            ..Default::default()
        };
        let meta = DocumentMetadata::build("bio.pdf", FileType::Pdf, 2048, &properties, "Cells\n\nCells divide often.");

        assert_eq!(meta.title, "Cells");
        assert_eq!(meta.char_count, 26);
        assert_eq!(meta.word_count, 4);
        assert_eq!(meta.line_count, 3);
        assert_eq!(meta.content_hash, format!("{:x}", md5::compute("Cells\n\nCells divide often.")));
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.extracted_at).is_ok());
        assert!(uuid::Uuid::parse_str(&meta.document_id).is_ok());
    }

    #[test]
    fn test_to_map_omits_absent_fields() {
        let properties = DocumentProperties {
            author: Some("A. Student".to_string()),
            ..Default::default()
        };
        let map = DocumentMetadata::build("notes.txt", FileType::Txt, 10, &properties, "Hi").to_map();

        assert_eq!(map["file_type"], "txt");
        assert_eq!(map["author"], "A. Student");
        assert_eq!(map["document_title"], "Hi");
        assert!(!map.contains_key("subject"));
        assert!(!map.contains_key("page_count"));
    }

    #[test]
    fn test_extract_metadata_reads_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Osmosis basics").unwrap();
        let extracted = ExtractedDocument {
            text: "Osmosis basics".to_string(),
            ..Default::default()
        };

        let meta = extract_metadata(&path, FileType::Txt, &extracted, "Osmosis basics").unwrap();
        assert_eq!(meta.file_name, "notes.txt");
        assert_eq!(meta.file_size_bytes, 14);
        assert_eq!(meta.title, "Osmosis basics");
    }
}
