//! DOCX extractor
//!
//! Body text comes from `word/document.xml` via docx-rust. Core properties
//! (`docProps/core.xml`) and the page count last saved by Word
//! (`docProps/app.xml`) are read straight from the archive.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use docx_rust::DocxFile;
use regex::Regex;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{non_blank, DocumentExtractor, DocumentProperties, ExtractedDocument};
use crate::error::{IngestError, Result};
use crate::types::FileType;

const CORE_XML: &str = "docProps/core.xml";
const APP_XML: &str = "docProps/app.xml";

static CORE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(dc:title|dc:creator|dc:subject|dcterms:created)(?:\s[^>]*)?>(.*?)</(?:dc|dcterms):\w+>")
        .expect("valid regex")
});

static PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Pages>\s*(\d+)\s*</Pages>").expect("valid regex"));

/// DOCX extractor backed by docx-rust
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for DocxExtractor {
    fn file_type(&self) -> FileType {
        FileType::Docx
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractedDocument> {
        let text = body_text(bytes)?;

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| IngestError::parse(FileType::Docx, format!("not a zip archive: {}", e)))?;

        let mut properties = match read_entry(&mut archive, CORE_XML)? {
            Some(core) => core_properties(&core),
            None => DocumentProperties::default(),
        };
        if let Some(app) = read_entry(&mut archive, APP_XML)? {
            properties.page_count = PAGES
                .captures(&app)
                .and_then(|caps| caps[1].parse().ok());
        }

        Ok(ExtractedDocument { text, properties })
    }
}

/// Paragraph text, one paragraph per line
fn body_text(bytes: &[u8]) -> Result<String> {
    let file = DocxFile::from_reader(Cursor::new(bytes))
        .map_err(|e| IngestError::parse(FileType::Docx, format!("not a docx package: {}", e)))?;
    let docx = file
        .parse()
        .map_err(|e| IngestError::parse(FileType::Docx, e.to_string()))?;
    Ok(docx.document.body.text())
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(IngestError::parse(FileType::Docx, format!("{}: {}", name, e))),
    };

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| IngestError::parse(FileType::Docx, format!("{}: {}", name, e)))?;
    Ok(Some(xml))
}

fn core_properties(xml: &str) -> DocumentProperties {
    let mut properties = DocumentProperties::default();
    for caps in CORE_FIELD.captures_iter(xml) {
        let slot = match &caps[1] {
            "dc:title" => &mut properties.title,
            "dc:creator" => &mut properties.author,
            "dc:subject" => &mut properties.subject,
            _ => &mut properties.created,
        };
        if slot.is_none() {
            *slot = non_blank(unescape(&caps[2]));
        }
    }
    properties
}

/// Predefined XML entities; `&amp;` last so `&amp;lt;` stays `&lt;`
fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

    const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Cell Structure</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>The nucleus &amp; the ribosome.</w:t></w:r></w:p><w:p><w:r><w:t>Mito</w:t></w:r><w:r><w:t>chondria</w:t></w:r></w:p></w:body></w:document>"#;

    const CORE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>Biology 101 &lt;Unit 2&gt;</dc:title><dc:subject>   </dc:subject><dc:creator>Dr. Rivera</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">2024-02-01T10:00:00Z</dcterms:created></cp:coreProperties>"#;

    const APP: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Pages>3</Pages><Words>120</Words></Properties>"#;

    fn docx(extra: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let base = [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", RELS),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ];
        for (name, content) in base.iter().chain(extra) {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_body_text() {
        let bytes = docx(&[("word/document.xml", BODY)]);
        let doc = DocxExtractor::new().extract_bytes(&bytes).unwrap();
        let lines: Vec<&str> = doc.text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(
            lines,
            vec!["Cell Structure", "The nucleus & the ribosome.", "Mitochondria"]
        );
        assert_eq!(doc.properties, DocumentProperties::default());
    }

    #[test]
    fn test_properties() {
        let bytes = docx(&[("word/document.xml", BODY), (CORE_XML, CORE), (APP_XML, APP)]);
        let doc = DocxExtractor::new().extract_bytes(&bytes).unwrap();
        assert_eq!(doc.properties.title.as_deref(), Some("Biology 101 <Unit 2>"));
        assert_eq!(doc.properties.author.as_deref(), Some("Dr. Rivera"));
        assert_eq!(doc.properties.subject, None);
        assert_eq!(doc.properties.created.as_deref(), Some("2024-02-01T10:00:00Z"));
        assert_eq!(doc.properties.page_count, Some(3));
    }

    #[test]
    fn test_missing_document_xml() {
        let bytes = docx(&[(CORE_XML, CORE)]);
        let err = DocxExtractor::new().extract_bytes(&bytes).unwrap_err();
        assert!(matches!(err, IngestError::Parse { format: FileType::Docx, .. }));
    }

    #[test]
    fn test_not_a_zip() {
        let err = DocxExtractor::new().extract_bytes(b"plain text pretending").unwrap_err();
        assert!(matches!(err, IngestError::Parse { format: FileType::Docx, .. }));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &lt;b&gt; &quot;c&quot; &apos;d&apos;"), "a <b> \"c\" 'd'");
        assert_eq!(unescape("AT&amp;T &amp;lt;"), "AT&T &lt;");
    }
}
