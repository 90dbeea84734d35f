//! PDF extractor
//!
//! Pulls page text in page order with lopdf and reads title, author,
//! subject and creation date from the trailer `Info` dictionary.

use lopdf::{Dictionary, Document, Object};
use tracing::{debug, warn};

use super::{non_blank, DocumentExtractor, DocumentProperties, ExtractedDocument};
use crate::error::{IngestError, Result};
use crate::types::FileType;

/// PDF extractor backed by lopdf
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for PdfExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractedDocument> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| IngestError::parse(FileType::Pdf, e.to_string()))?;

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(IngestError::parse(FileType::Pdf, "document is encrypted"));
        }

        let pages = doc.get_pages();
        let mut page_texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => page_texts.push(text),
                Err(e) => warn!(page = page_number, error = %e, "skipping PDF page without decodable text"),
            }
        }
        debug!(pages = pages.len(), decoded = page_texts.len(), "extracted PDF text");

        let info = info_dictionary(&doc);
        let property = |key: &[u8]| info.and_then(|dict| string_entry(dict, key));

        Ok(ExtractedDocument {
            text: page_texts.join("\n\n"),
            properties: DocumentProperties {
                title: property(b"Title"),
                author: property(b"Author"),
                subject: property(b"Subject"),
                created: property(b"CreationDate").map(|raw| format_pdf_date(&raw)),
                page_count: Some(pages.len()),
            },
        })
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    non_blank(decode_pdf_string(bytes))
}

/// Text strings are UTF-16BE when they start with a BOM, otherwise a
/// single-byte encoding close enough to Latin-1 for metadata.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(rest) => super::txt::decode_utf16(rest, u16::from_be_bytes),
        None => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// `D:20240131093000+01'00'` becomes `2024-01-31T09:30:00`; anything else is kept as-is
fn format_pdf_date(raw: &str) -> String {
    let digits: String = raw
        .trim_start_matches("D:")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() < 8 {
        return raw.to_string();
    }

    let part = |from: usize, to: usize, default: &'static str| digits.get(from..to).unwrap_or(default).to_string();
    format!(
        "{}-{}-{}T{}:{}:{}",
        part(0, 4, "0000"),
        part(4, 6, "01"),
        part(6, 8, "01"),
        part(8, 10, "00"),
        part(10, 12, "00"),
        part(12, 14, "00"),
    )
}
