/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("no vector index loaded for collection '{collection}'")]
    NoIndex { collection: String },

    #[error("search failed: {reason}")]
    SearchFailed { reason: String },

    #[error("rerank provider failed: {reason}")]
    RerankFailed { reason: String },
}
