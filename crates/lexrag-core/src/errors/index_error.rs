/// Vector-index subsystem errors.
///
/// A missing or corrupt index is treated as "absent" by the manager (it
/// triggers the fresh-create path); `Corrupt` exists so the condition can be
/// logged with a cause before being downgraded.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("index artifact unreadable: {reason}")]
    Corrupt { reason: String },

    #[error("vector dimension mismatch: index has {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("chunk/vector count mismatch: {chunks} chunks, {vectors} vectors")]
    CountMismatch { chunks: usize, vectors: usize },

    #[error("io error on index artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
