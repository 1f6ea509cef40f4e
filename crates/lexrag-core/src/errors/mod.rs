//! Error taxonomy for the lexrag pipeline.
//!
//! One error enum per subsystem, aggregated into [`RagError`]. Per-document
//! and per-chunk failures are recovered close to where they occur and
//! aggregated into a `FailureReport`; only configuration errors are expected
//! to surface to users as fatal.

mod config_error;
mod embedding_error;
mod index_error;
mod ingest_error;
mod retrieval_error;
mod structure_error;

pub use config_error::ConfigError;
pub use embedding_error::EmbeddingError;
pub use index_error::IndexError;
pub use ingest_error::IngestError;
pub use retrieval_error::RetrievalError;
pub use structure_error::StructureError;

/// Top-level error type; every subsystem error converts into it.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RagResult<T> = std::result::Result<T, RagError>;
