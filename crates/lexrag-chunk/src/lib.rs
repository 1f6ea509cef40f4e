//! # lexrag-chunk
//!
//! Turns extracted document text into token-bounded [`Chunk`]s while
//! preserving semantic boundaries. Legal documents get a structural
//! splitter (header + one chunk per article, chapter-aware); everything
//! else goes through a sentence-boundary splitter. A uniform token-limit
//! pass guarantees every emitted chunk fits the embedding budget and can be
//! reassembled losslessly from its siblings.
//!
//! [`Chunk`]: lexrag_core::Chunk

pub mod generic;
pub mod law;
pub mod limit;
pub mod numerals;
pub mod tokens;

pub use generic::split_generic;
pub use law::{detect_legal_document, extract_law_metadata, extract_law_title, split_legal_document};
pub use limit::{enforce_token_limit, merge_sibling_chunks, split_text_by_token_limit};
pub use numerals::chinese_numeral_to_int;
pub use tokens::TokenCounter;
