//! Default plain-text extractor.
//!
//! Raw-format handling (PDF, Word, OCR, …) lives behind the `TextExtractor`
//! trait; this implementation covers plain-text sources with a lossy-decode
//! fallback for files in legacy encodings.

use std::path::Path;

use tracing::warn;

use lexrag_core::traits::{Extraction, TextExtractor};

#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path, filename: &str, declared_type: &str) -> Extraction {
        match std::fs::read(path) {
            Ok(bytes) => {
                let text = match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(filename, "file is not UTF-8, decoding lossily");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                let content_type = if declared_type.is_empty() {
                    "text/plain".to_string()
                } else {
                    declared_type.to_string()
                };
                Extraction { text, content_type, ok: true }
            }
            Err(e) => Extraction {
                text: format!("无法读取文件 {filename}: {e}"),
                content_type: declared_type.to_string(),
                ok: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "第一条 内容").unwrap();
        let out = PlainTextExtractor::new().extract(&path, "a.txt", "text/plain");
        assert!(out.ok);
        assert_eq!(out.text, "第一条 内容");
        assert_eq!(out.content_type, "text/plain");
    }

    #[test]
    fn missing_file_is_reported_not_thrown() {
        let out = PlainTextExtractor::new().extract(Path::new("/no/such/file"), "x.txt", "");
        assert!(!out.ok);
        assert!(out.text.contains("x.txt"));
    }

    #[test]
    fn invalid_utf8_decodes_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gbk.txt");
        std::fs::write(&path, [0xD6u8, 0xD0, 0xB9, 0xFA]).unwrap();
        let out = PlainTextExtractor::new().extract(&path, "gbk.txt", "");
        assert!(out.ok);
        assert!(!out.text.is_empty());
    }
}
