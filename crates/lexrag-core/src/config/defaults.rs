//! Named default values for all config structs.

/// Per-chunk token budget enforced after splitting.
pub const DEFAULT_MAX_TOKENS: usize = 8192;

/// Token overlap requested between fragments (see DESIGN notes; kept for
/// API compatibility, reassembly requires lossless concatenation).
pub const DEFAULT_OVERLAP: usize = 10;

/// Character budget for one generic-splitter block.
pub const DEFAULT_SENTENCE_SIZE: usize = 250;

/// Per-item token ceiling assumed for embedding providers.
pub const DEFAULT_EMBED_TOKEN_LIMIT: usize = 8192;

/// Items per embedding batch.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 16;

/// Dimension of fallback zero vectors before any call has succeeded.
pub const DEFAULT_EMBED_DIMENSION: usize = 1024;

/// Retry ceiling for transient provider errors.
pub const DEFAULT_EMBED_MAX_RETRIES: usize = 10;

/// First backoff delay; grows by 1.5x per retry.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// HTTP timeout for provider calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Shrink factor applied to the token limit when a provider still rejects
/// pre-split input.
pub const TOKEN_LIMIT_SHRINK: f64 = 0.7;

/// Results returned by retrieval.
pub const DEFAULT_TOP_K: usize = 5;

/// Minimum relevance kept after reranking.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.05;

/// Retrieval cache time-to-live.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Retrieval cache capacity (entries).
pub const DEFAULT_CACHE_CAPACITY: u64 = 100;

/// Chunks merged into the index per batch during ingestion.
pub const DEFAULT_INDEX_BATCH_SIZE: usize = 32;
