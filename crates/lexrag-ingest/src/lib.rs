//! # lexrag-ingest
//!
//! The background ingestion pipeline. A caller hands over a list of source
//! files and immediately receives a task id; a worker thread extracts,
//! chunks, embeds, and merges into the vector index, reporting progress to
//! an injected task store and honoring cooperative cancellation at every
//! per-file and per-batch boundary. Cancellation never leaves the index or
//! hash ledger half-written: merged-and-saved batches stay, unsaved work is
//! discarded.

pub mod extractor;
pub mod pipeline;
pub mod task;

pub use extractor::PlainTextExtractor;
pub use pipeline::{IngestRequest, IngestionPipeline, SourceFile};
pub use task::TaskStore;
