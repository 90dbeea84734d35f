//! File type detection by file name suffix.
//!
//! Only the trailing extension is considered. Matching is case-sensitive
//! and the file content is never inspected.

use std::path::Path;

use crate::error::{IngestError, Result};
use crate::types::FileType;

/// Map a path to its [`FileType`] using the exact, case-sensitive suffix.
pub fn detect_file_type(path: impl AsRef<Path>) -> Result<FileType> {
    let path = path.as_ref();
    let name = path.to_string_lossy();

    FileType::all()
        .into_iter()
        .find(|file_type| name.ends_with(file_type.extension()))
        .ok_or_else(|| IngestError::UnsupportedFileType(path.to_path_buf()))
}

/// Whether [`detect_file_type`] would accept this path
pub fn is_supported(path: impl AsRef<Path>) -> bool {
    detect_file_type(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert_eq!(detect_file_type("notes.txt").unwrap(), FileType::Txt);
        assert_eq!(detect_file_type("lecture.pdf").unwrap(), FileType::Pdf);
        assert_eq!(detect_file_type("essay.docx").unwrap(), FileType::Docx);
        assert_eq!(
            detect_file_type("/uploads/week 3/slides.pdf").unwrap(),
            FileType::Pdf
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let err = detect_file_type("notes.xyz").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type");
        assert!(matches!(err, IngestError::UnsupportedFileType(p) if p.ends_with("notes.xyz")));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(detect_file_type("NOTES.TXT").is_err());
        assert!(detect_file_type("Report.Pdf").is_err());
    }

    #[test]
    fn test_suffix_must_be_trailing() {
        assert!(detect_file_type("notes.pdf.bak").is_err());
        assert!(detect_file_type("notes.doc").is_err());
        assert!(detect_file_type("notes").is_err());
        assert!(is_supported("archive/notes.txt"));
        assert!(!is_supported("archive/notes.md"));
    }
}
