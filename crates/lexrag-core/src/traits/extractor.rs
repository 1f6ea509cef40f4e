use std::path::Path;

/// Output of the text extractor.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted plain text, or a human-readable error description when
    /// extraction failed (see [`TextExtractor::extract`]).
    pub text: String,
    /// Declared or detected content type, e.g. "text/plain".
    pub content_type: String,
    /// Whether extraction succeeded. On failure `text` holds the reason.
    pub ok: bool,
}

/// Turns a raw source file into plain text.
///
/// Raw-format handling (PDF, Word, OCR, …) lives behind this trait; the
/// pipeline only sees plain text plus a declared content type.
pub trait TextExtractor: Send + Sync {
    /// Total function: never panics and never errors. On failure the
    /// returned `Extraction` has `ok == false` and a human-readable reason
    /// as its `text`.
    fn extract(&self, path: &Path, filename: &str, declared_type: &str) -> Extraction;
}
