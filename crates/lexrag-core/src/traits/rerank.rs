use crate::errors::RetrievalError;

/// A provider that scores (query, candidate) pairs for relevance.
pub trait RerankProvider: Send + Sync {
    /// Score each document against the query; one score per document, in
    /// input order, higher is more relevant.
    fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalError>;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
