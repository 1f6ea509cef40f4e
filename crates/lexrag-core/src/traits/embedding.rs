use crate::errors::EmbeddingError;

/// A raw embedding provider.
///
/// Providers are allowed to fail; structural pushback (`TokenLimit`,
/// `BatchTooLarge`) and transient errors are handled by the embedding
/// engine, which owns retries, bisection, and the zero-vector fallback.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
