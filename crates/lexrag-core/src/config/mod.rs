//! Pipeline configuration.
//!
//! Serde/TOML config structs with defaults. Providers are a closed set of
//! variants selected here, once, at construction time, never by string
//! dispatch at call sites.

pub mod defaults;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Chunking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Per-chunk token budget.
    pub max_tokens: usize,
    /// Requested fragment overlap (tokens).
    pub overlap: usize,
    /// Character budget for one generic-splitter block.
    pub sentence_size: usize,
    /// Exact tokenizer encoding to prefer over the CJK heuristic, when the
    /// target embedding model has a known encoding (e.g. "cl100k_base").
    pub tokenizer: Option<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
            overlap: defaults::DEFAULT_OVERLAP,
            sentence_size: defaults::DEFAULT_SENTENCE_SIZE,
            tokenizer: None,
        }
    }
}

/// The closed set of embedding provider variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// Any OpenAI-compatible batch embeddings endpoint.
    OpenAiCompatible,
    /// A local Ollama instance (per-item endpoint).
    Ollama,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Model name passed to the provider.
    pub model: String,
    /// Endpoint base, e.g. "https://api.siliconflow.cn/v1" or
    /// "http://localhost:11434/api".
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-item token ceiling the provider accepts.
    #[serde(default = "d_token_limit")]
    pub max_token_limit: usize,
    /// Items per request batch.
    #[serde(default = "d_batch_size")]
    pub max_batch_size: usize,
    /// Dimension of fallback zero vectors before any success.
    #[serde(default = "d_dimension")]
    pub default_dimension: usize,
    #[serde(default = "d_retries")]
    pub max_retries: usize,
    #[serde(default = "d_retry_delay")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "d_timeout")]
    pub request_timeout_secs: u64,
}

fn d_token_limit() -> usize {
    defaults::DEFAULT_EMBED_TOKEN_LIMIT
}
fn d_batch_size() -> usize {
    defaults::DEFAULT_EMBED_BATCH_SIZE
}
fn d_dimension() -> usize {
    defaults::DEFAULT_EMBED_DIMENSION
}
fn d_retries() -> usize {
    defaults::DEFAULT_EMBED_MAX_RETRIES
}
fn d_retry_delay() -> u64 {
    defaults::DEFAULT_RETRY_BASE_DELAY_MS
}
fn d_timeout() -> u64 {
    defaults::DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Rerank provider configuration. Absent means no reranking pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    pub model: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_timeout")]
    pub request_timeout_secs: u64,
}

/// Retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Results returned per query.
    pub top_k: usize,
    /// Minimum relevance kept after reranking (waived when it would empty
    /// the result set).
    pub score_threshold: f32,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    /// Law assumed for bare article queries ("第X条" with no law name).
    /// When unset such queries search across all indexed laws.
    pub default_law: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::DEFAULT_TOP_K,
            score_threshold: defaults::DEFAULT_SCORE_THRESHOLD,
            cache_ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            cache_capacity: defaults::DEFAULT_CACHE_CAPACITY,
            default_law: None,
        }
    }
}

/// Index-manager parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding index pairs, the hash ledger, and law structures.
    pub root_dir: PathBuf,
    /// Chunks merged into the index per batch during ingestion.
    pub batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data/index"),
            batch_size: defaults::DEFAULT_INDEX_BATCH_SIZE,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunking: ChunkingConfig,
    /// Required for any pipeline that embeds; absence is the one fatal
    /// user-visible configuration error.
    pub embedding: Option<EmbeddingConfig>,
    pub reranker: Option<RerankerConfig>,
    pub retrieval: RetrievalConfig,
    pub index: IndexConfig,
}

impl RagConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// The embedding config, or the fatal configuration error.
    pub fn embedding_or_err(&self) -> Result<&EmbeddingConfig, ConfigError> {
        self.embedding.as_ref().ok_or(ConfigError::MissingEmbeddingProvider)
    }
}
