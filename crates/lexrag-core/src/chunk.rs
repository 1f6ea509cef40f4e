//! The chunk data model.
//!
//! A `Chunk` is a token-bounded unit of source text with enough lineage
//! metadata to reassemble the logical unit it was split from and to trace
//! it back to its source document.

use serde::{Deserialize, Serialize};

/// What kind of content a chunk carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Front matter of a legal document (title, adoption/revision dates).
    Header,
    /// The body of one article of a legal document.
    ArticleContent,
    /// Synthesized listing of a law's chapters.
    LawOverview,
    /// Synthesized listing of a chapter's articles.
    ChapterOverview,
    /// Anything produced by the generic splitter.
    Generic,
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Generic
    }
}

/// Metadata parsed from a legal document's header block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMeta {
    /// Date the law was passed, e.g. "2001年12月29日".
    pub passed_date: Option<String>,
    /// Dates of later revisions, in document order.
    pub revised_dates: Vec<String>,
    /// NPC standing-committee meeting references.
    pub meetings: Vec<String>,
}

impl HeaderMeta {
    pub fn is_empty(&self) -> bool {
        self.passed_date.is_none() && self.revised_dates.is_empty() && self.meetings.is_empty()
    }
}

/// A token-bounded unit of source text.
///
/// Every chunk belongs to exactly one source document. Chunks split from one
/// logical unit share a `parent_id` (content hash of the original text) and
/// carry `chunk_index`/`total_chunks` so siblings can be reassembled
/// losslessly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// The text payload.
    pub text: String,
    /// Source document identifier (usually the file name).
    pub source: String,
    /// Position among siblings sharing `parent_id`.
    #[serde(default)]
    pub chunk_index: usize,
    /// Sibling count for the parent unit.
    #[serde(default = "one")]
    pub total_chunks: usize,
    /// Content hash of the parent unit, present iff this chunk was split.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Whether this chunk is a fragment of a larger unit.
    #[serde(default)]
    pub is_split: bool,
    /// Name of the law this chunk belongs to, for legal documents.
    #[serde(default)]
    pub law_name: Option<String>,
    /// Chapter number within the law.
    #[serde(default)]
    pub chapter_num: Option<u32>,
    /// Chapter title, e.g. "总则".
    #[serde(default)]
    pub chapter_title: Option<String>,
    /// Article number within the law.
    #[serde(default)]
    pub article_num: Option<u32>,
    /// What kind of content this is.
    #[serde(default)]
    pub content_type: ContentType,
    /// Relevance score assigned during retrieval.
    #[serde(default)]
    pub score: Option<f32>,
    /// True when this chunk was located via structural lookup rather than
    /// vector similarity.
    #[serde(default)]
    pub exact_match: bool,
    /// Set when the chunk could not be split further yet still exceeds the
    /// token budget; emitted as-is instead of being truncated.
    #[serde(default)]
    pub over_budget: bool,
    /// Header metadata, present on `Header` chunks.
    #[serde(default)]
    pub header_meta: Option<HeaderMeta>,
}

fn one() -> usize {
    1
}

impl Chunk {
    /// Create a standalone chunk with no lineage metadata.
    pub fn new(text: impl Into<String>, source: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            chunk_index: 0,
            total_chunks: 1,
            parent_id: None,
            is_split: false,
            law_name: None,
            chapter_num: None,
            chapter_title: None,
            article_num: None,
            content_type,
            score: None,
            exact_match: false,
            over_budget: false,
            header_meta: None,
        }
    }

    /// Content hash of this chunk's text, used as the `parent_id` of any
    /// fragments split from it.
    pub fn content_hash(&self) -> String {
        hash_text(&self.text)
    }

    /// The retrieval score, defaulting to 0 when unset.
    pub fn score_or_zero(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }
}

/// blake3 hex digest of a text, the canonical content hash everywhere in
/// the pipeline (parent ids, file dedup, cache keys).
pub fn hash_text(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// blake3 hex digest of raw bytes (file contents for the hash ledger).
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_is_standalone() {
        let c = Chunk::new("hello", "a.txt", ContentType::Generic);
        assert!(!c.is_split);
        assert_eq!(c.total_chunks, 1);
        assert!(c.parent_id.is_none());
    }

    #[test]
    fn content_hash_is_stable() {
        let a = Chunk::new("same text", "x", ContentType::Generic);
        let b = Chunk::new("same text", "y", ContentType::Header);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn serde_roundtrip_with_defaults() {
        let json = r#"{"text":"t","source":"s"}"#;
        let c: Chunk = serde_json::from_str(json).unwrap();
        assert_eq!(c.total_chunks, 1);
        assert_eq!(c.content_type, ContentType::Generic);
        assert!(!c.exact_match);
    }
}
