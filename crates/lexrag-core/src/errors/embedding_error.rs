/// Embedding subsystem errors.
///
/// `TokenLimit` and `BatchTooLarge` are provider pushback the engine reacts
/// to structurally (re-split / bisect); everything else is retried and then
/// recovered with zero vectors; these never reach callers of the engine.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("provider rejected input over its {limit}-token limit")]
    TokenLimit { limit: usize },

    #[error("provider rejected batch of {size} items as too large")]
    BatchTooLarge { size: usize },

    #[error("provider request failed: {reason}")]
    Provider { reason: String },

    #[error("provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
