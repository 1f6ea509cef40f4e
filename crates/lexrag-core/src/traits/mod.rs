//! Capability traits at the seams of the pipeline.

mod embedding;
mod extractor;
mod generation;
mod progress;
mod rerank;

pub use embedding::EmbeddingProvider;
pub use extractor::{Extraction, TextExtractor};
pub use generation::GenerationProvider;
pub use progress::ProgressSink;
pub use rerank::RerankProvider;
