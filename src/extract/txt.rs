//! Plain text extractor
//!
//! UTF-8 with or without BOM, UTF-16 when a BOM says so. Anything else is
//! decoded lossily.

use tracing::warn;

use super::{DocumentExtractor, ExtractedDocument};
use crate::error::Result;
use crate::types::FileType;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

pub struct TxtExtractor;

impl TxtExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TxtExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for TxtExtractor {
    fn file_type(&self) -> FileType {
        FileType::Txt
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractedDocument> {
        Ok(ExtractedDocument {
            text: decode_text(bytes),
            ..Default::default()
        })
    }
}

fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(err) => {
            warn!(valid_up_to = err.valid_up_to(), "text file is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

pub(crate) fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let doc = TxtExtractor::new().extract_bytes("Zellbiologie – Grundlagen".as_bytes()).unwrap();
        assert_eq!(doc.text, "Zellbiologie – Grundlagen");
        assert_eq!(doc.properties, Default::default());
    }

    #[test]
    fn test_strips_utf8_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"notes");
        assert_eq!(decode_text(&bytes), "notes");
    }

    #[test]
    fn test_utf16_le_and_be() {
        let mut le = UTF16_LE_BOM.to_vec();
        let mut be = UTF16_BE_BOM.to_vec();
        for unit in "Hé".encode_utf16() {
            le.extend_from_slice(&unit.to_le_bytes());
            be.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text(&le), "Hé");
        assert_eq!(decode_text(&be), "Hé");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        assert_eq!(decode_text(&[b'o', b'k', 0xFF]), "ok\u{FFFD}");
    }

    #[test]
    fn test_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Mitosis has four phases.").unwrap();

        let doc = TxtExtractor::new().extract(&path).unwrap();
        assert_eq!(doc.text, "Mitosis has four phases.");
    }
}
