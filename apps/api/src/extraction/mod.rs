//! Text extraction — turns an uploaded or downloaded file into plain text.
//!
//! Supported: .docx (paragraphs + table cells), .pdf (via `pdf-extract`), plain text.
//! Anything that fails or is unrecognised falls back to a lossy UTF-8 decode, so
//! extraction itself never fails.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use crate::docx::DocxTemplate;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MIME: &str = "application/pdf";
pub const TEXT_MIME: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    Pdf,
    PlainText,
    Unknown,
}

impl DocumentFormat {
    /// Detects the format from the file name, then the MIME type, then magic bytes.
    pub fn detect(file_name: &str, content_type: Option<&str>, bytes: &[u8]) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".docx") {
            return Self::Docx;
        }
        if lower.ends_with(".pdf") {
            return Self::Pdf;
        }
        if lower.ends_with(".txt") || lower.ends_with(".md") {
            return Self::PlainText;
        }

        match content_type {
            Some(DOCX_MIME) => return Self::Docx,
            Some(PDF_MIME) => return Self::Pdf,
            Some(ct) if ct.starts_with("text/") => return Self::PlainText,
            _ => {}
        }

        if bytes.starts_with(b"%PDF") {
            Self::Pdf
        } else if bytes.starts_with(b"PK\x03\x04") {
            Self::Docx
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Docx,
    Pdf,
    PlainText,
    LossyFallback,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
}

impl ExtractedText {
    fn fallback(bytes: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(bytes).into_owned(),
            method: ExtractionMethod::LossyFallback,
        }
    }
}

/// Synchronous extraction. CPU-bound for PDFs and .docx — call from `spawn_blocking`.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> ExtractedText {
    let extracted = match format {
        DocumentFormat::Docx => DocxTemplate::from_bytes(bytes)
            .map(|t| ExtractedText {
                text: t.document().plain_text(),
                method: ExtractionMethod::Docx,
            })
            .map_err(|e| e.to_string()),
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map(|text| ExtractedText {
                text,
                method: ExtractionMethod::Pdf,
            })
            .map_err(|e| e.to_string()),
        DocumentFormat::PlainText => std::str::from_utf8(bytes)
            .map(|text| ExtractedText {
                text: text.to_string(),
                method: ExtractionMethod::PlainText,
            })
            .map_err(|e| e.to_string()),
        DocumentFormat::Unknown => Err("unrecognised format".to_string()),
    };

    match extracted {
        Ok(extracted) => {
            debug!(
                method = ?extracted.method,
                chars = extracted.text.chars().count(),
                "Extracted text"
            );
            extracted
        }
        Err(reason) => {
            warn!("Text extraction as {format:?} failed ({reason}); using raw decode");
            ExtractedText::fallback(bytes)
        }
    }
}

/// Runs `extract_text` on the blocking pool. A panic inside a parser degrades to
/// the lossy fallback like any other extraction failure.
pub async fn extract_text_async(bytes: Bytes, format: DocumentFormat) -> ExtractedText {
    let raw = bytes.clone();
    match tokio::task::spawn_blocking(move || extract_text(&bytes, format)).await {
        Ok(extracted) => extracted,
        Err(e) => {
            warn!("Text extraction task failed: {e}");
            ExtractedText::fallback(&raw)
        }
    }
}

/// Truncates to at most `max_chars` characters on a char boundary.
/// Returns the (possibly shortened) text and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::package::test_docx;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(DocumentFormat::detect("RFP.DOCX", None, b""), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::detect("brief.pdf", None, b""), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::detect("notes.md", None, b""), DocumentFormat::PlainText);
    }

    #[test]
    fn test_detect_by_mime_then_magic() {
        assert_eq!(
            DocumentFormat::detect("upload", Some(PDF_MIME), b""),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect("upload", None, b"%PDF-1.7"),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect("upload", None, b"PK\x03\x04rest"),
            DocumentFormat::Docx
        );
        assert_eq!(
            DocumentFormat::detect("upload.bin", Some("application/octet-stream"), b"\x00\x01"),
            DocumentFormat::Unknown
        );
    }

    #[test]
    fn test_extract_docx_text() {
        let bytes = test_docx(r#"<w:p><w:r><w:t>Scope of work</w:t></w:r></w:p>"#);
        let extracted = extract_text(&bytes, DocumentFormat::Docx);
        assert_eq!(extracted.method, ExtractionMethod::Docx);
        assert_eq!(extracted.text, "Scope of work");
    }

    #[test]
    fn test_broken_docx_falls_back_to_lossy_decode() {
        let extracted = extract_text(b"plain words, not a zip", DocumentFormat::Docx);
        assert_eq!(extracted.method, ExtractionMethod::LossyFallback);
        assert_eq!(extracted.text, "plain words, not a zip");
    }

    #[test]
    fn test_invalid_utf8_plain_text_falls_back() {
        let extracted = extract_text(b"caf\xe9", DocumentFormat::PlainText);
        assert_eq!(extracted.method, ExtractionMethod::LossyFallback);
        assert!(extracted.text.starts_with("caf"));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("hi", 5), ("hi", false));
        assert_eq!(truncate_chars("abc", 3), ("abc", false));
    }

    #[tokio::test]
    async fn test_extract_text_async_plain() {
        let extracted =
            extract_text_async(Bytes::from_static(b"hello"), DocumentFormat::PlainText).await;
        assert_eq!(extracted.text, "hello");
        assert_eq!(extracted.method, ExtractionMethod::PlainText);
    }
}
