use std::io::Read;
use std::path::Path;

use super::traits::{DocumentProcessor, ProcessedDocument};
use crate::error::DocumentError;

const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024; // 20MB

/// Extensions accepted even when the MIME table disagrees.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// Whether a path names a plain-text document, by MIME type or extension.
pub fn is_text_document(path: &Path) -> bool {
    let by_mime = mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::TEXT);
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    by_mime || by_extension
}

/// Check the first chunk of an extension-less file is valid, mostly printable UTF-8.
fn is_likely_text(path: &Path) -> Result<bool, DocumentError> {
    let mut file = std::fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];
    let n = file.read(&mut buffer)?;
    buffer.truncate(n);

    let text = match std::str::from_utf8(&buffer) {
        Ok(t) => t,
        Err(_) => return Ok(false),
    };
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    Ok(printable as f64 / text.chars().count().max(1) as f64 > 0.80)
}

/// Reads UTF-8 text documents. Notes are not split out; the whole text is
/// handed to the classifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextProcessor;

impl DocumentProcessor for PlainTextProcessor {
    fn process(&self, path: &Path) -> Result<ProcessedDocument, DocumentError> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(DocumentError::UnsupportedFormat(format!(
                "file exceeds {} bytes",
                MAX_FILE_SIZE
            )));
        }

        let accepted = if path.extension().is_some() {
            is_text_document(path)
        } else {
            is_likely_text(path)?
        };
        if !accepted {
            let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();
            return Err(DocumentError::UnsupportedFormat(mime));
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| DocumentError::Decode(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(DocumentError::Empty);
        }

        tracing::debug!(bytes = text.len(), "Plain text document read");
        Ok(ProcessedDocument {
            text,
            notes: Vec::new(),
            patient_info: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "Forensic history\nNil.").unwrap();
        let doc = PlainTextProcessor.process(&path).unwrap();
        assert_eq!(doc.text, "Forensic history\nNil.");
        assert!(doc.notes.is_empty());
        assert!(doc.patient_info.is_none());
    }

    #[test]
    fn markdown_accepted() {
        assert!(is_text_document(Path::new("notes.md")));
        assert!(is_text_document(Path::new("NOTES.TXT")));
        assert!(!is_text_document(Path::new("scan.pdf")));
    }

    #[test]
    fn extensionless_text_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export");
        std::fs::write(&path, "Plain clinical text").unwrap();
        assert!(PlainTextProcessor.process(&path).is_ok());
    }

    #[test]
    fn empty_file_is_empty_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "  \n ").unwrap();
        assert!(matches!(PlainTextProcessor.process(&path), Err(DocumentError::Empty)));
    }

    #[test]
    fn pdf_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        match PlainTextProcessor.process(&path) {
            Err(DocumentError::UnsupportedFormat(mime)) => assert_eq!(mime, "application/pdf"),
            other => panic!("expected unsupported format, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();
        assert!(matches!(PlainTextProcessor.process(&path), Err(DocumentError::Decode(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = PlainTextProcessor.process(Path::new("/nonexistent/clerking.txt"));
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }
}
