//! # lexrag-embeddings
//!
//! Converts chunk texts to fixed-dimension vectors via a configurable
//! provider, tolerating provider-side size limits. The engine is total:
//! callers always get exactly one vector per input, in input order; on
//! unrecoverable provider failure the affected inputs come back as zero
//! vectors and the failure is recorded as a degradation event.

pub mod engine;
pub mod providers;

pub use engine::EmbeddingEngine;
pub use providers::create_provider;
