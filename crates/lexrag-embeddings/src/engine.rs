//! The embedding engine.
//!
//! Orchestrates pre-splitting, batching, provider pushback handling, and
//! the zero-vector fallback. Total for callers: `embed_batch` returns
//! exactly one vector per input, in input order, and never fails: failed
//! inputs degrade to zero vectors whose dimension matches the other vectors
//! of the same call (or the configured default when nothing succeeded).

use std::sync::Mutex;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use lexrag_chunk::{split_text_by_token_limit, TokenCounter};
use lexrag_core::config::defaults::TOKEN_LIMIT_SHRINK;
use lexrag_core::config::{ChunkingConfig, EmbeddingConfig, RagConfig};
use lexrag_core::errors::{ConfigError, EmbeddingError};
use lexrag_core::models::DegradationEvent;
use lexrag_core::traits::EmbeddingProvider;

use crate::providers;

/// Bound on recursive bisect/re-split passes; beyond it inputs degrade to
/// zero vectors instead of recursing further.
const MAX_SPLIT_DEPTH: usize = 4;

pub struct EmbeddingEngine {
    provider: Box<dyn EmbeddingProvider>,
    counter: TokenCounter,
    config: EmbeddingConfig,
    events: Mutex<Vec<DegradationEvent>>,
}

impl EmbeddingEngine {
    /// Build from the top-level config. Missing embedding configuration is
    /// the fatal error; everything downstream is recoverable.
    pub fn from_config(cfg: &RagConfig) -> Result<Self, ConfigError> {
        let embedding = cfg.embedding_or_err()?.clone();
        let provider = providers::create_provider(&embedding)?;
        Ok(Self::with_provider(provider, embedding, &cfg.chunking))
    }

    /// Build around an explicit provider (also the seam used by tests).
    pub fn with_provider(
        provider: Box<dyn EmbeddingProvider>,
        config: EmbeddingConfig,
        chunking: &ChunkingConfig,
    ) -> Self {
        info!(
            provider = provider.name(),
            batch_size = config.max_batch_size,
            token_limit = config.max_token_limit,
            "embedding engine initialized"
        );
        Self {
            provider,
            counter: TokenCounter::from_config(chunking),
            config,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Embed one text. Never fails; see [`EmbeddingEngine::embed_batch`].
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        self.embed_batch(std::slice::from_ref(&text.to_string()))
            .into_iter()
            .next()
            .unwrap_or_else(|| vec![0.0; self.config.default_dimension])
    }

    /// Embed a batch of texts: one vector per input, in input order.
    ///
    /// Over-limit inputs are pre-split by sentence/clause and their
    /// sub-embeddings recombined by element-wise arithmetic mean, so the
    /// caller still receives exactly one vector per original input.
    pub fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        // Pre-split anything over the provider's per-item limit and keep a
        // sub-range per original input.
        let mut flat: Vec<String> = Vec::with_capacity(texts.len());
        let mut spans: Vec<std::ops::Range<usize>> = Vec::with_capacity(texts.len());
        for text in texts {
            let cleaned = text.trim();
            let subs = if cleaned.is_empty() {
                vec![String::new()]
            } else {
                split_text_by_token_limit(cleaned, self.config.max_token_limit, &self.counter)
            };
            let start = flat.len();
            flat.extend(subs);
            spans.push(start..flat.len());
        }

        // Submit provider-sized batches in parallel; rayon preserves input
        // order in the collected output regardless of completion order.
        let batch_size = self.config.max_batch_size.max(1);
        let batches: Vec<&[String]> = flat.chunks(batch_size).collect();
        let results: Vec<Option<Vec<f32>>> = batches
            .par_iter()
            .flat_map_iter(|batch| self.submit(batch, self.config.max_token_limit, 0))
            .collect();

        // Zero-vector dimension must match any vector that succeeded in
        // this call so the resulting index stays dimensionally consistent.
        let dim = results
            .iter()
            .flatten()
            .map(Vec::len)
            .find(|d| *d > 0)
            .unwrap_or(self.config.default_dimension);

        spans
            .into_iter()
            .map(|span| {
                let subs: Vec<&Vec<f32>> = results[span].iter().flatten().collect();
                match mean_vector(&subs) {
                    Some(v) => v,
                    None => vec![0.0; dim],
                }
            })
            .collect()
    }

    /// Submit one batch, reacting to provider pushback:
    /// batch-too-large → bisect; token-limit → re-split each item at a
    /// stricter limit and mean-combine; transient errors → exponential
    /// backoff up to the retry ceiling, then zero placeholders.
    fn submit(&self, batch: &[String], token_limit: usize, depth: usize) -> Vec<Option<Vec<f32>>> {
        if batch.is_empty() {
            return Vec::new();
        }
        let mut delay = Duration::from_millis(self.config.retry_base_delay_ms);
        let mut attempt = 0usize;
        loop {
            match self.provider.embed_batch(batch) {
                Ok(vectors) if vectors.len() == batch.len() => {
                    return vectors.into_iter().map(Some).collect();
                }
                Ok(vectors) => {
                    self.record(
                        EmbeddingError::CountMismatch { expected: batch.len(), got: vectors.len() },
                        "zero vectors",
                    );
                    return vec![None; batch.len()];
                }
                Err(EmbeddingError::BatchTooLarge { .. })
                    if batch.len() > 1 && depth < MAX_SPLIT_DEPTH =>
                {
                    debug!(size = batch.len(), depth, "bisecting oversized batch");
                    let mid = batch.len() / 2;
                    let mut left = self.submit(&batch[..mid], token_limit, depth + 1);
                    left.extend(self.submit(&batch[mid..], token_limit, depth + 1));
                    return left;
                }
                Err(EmbeddingError::TokenLimit { limit }) if depth < MAX_SPLIT_DEPTH => {
                    let effective = if limit > 0 { limit.min(token_limit) } else { token_limit };
                    let stricter =
                        ((effective as f64 * TOKEN_LIMIT_SHRINK) as usize).max(1);
                    debug!(stricter, depth, "re-splitting batch items at stricter token limit");
                    return batch
                        .iter()
                        .map(|item| self.embed_resplit(item, stricter, depth + 1))
                        .collect();
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        self.record(e, "zero vectors");
                        return vec![None; batch.len()];
                    }
                    warn!(
                        provider = self.provider.name(),
                        error = %e,
                        attempt,
                        max = self.config.max_retries,
                        "provider error, backing off"
                    );
                    std::thread::sleep(delay);
                    delay = delay.mul_f64(1.5);
                }
            }
        }
    }

    /// Re-split one item at a stricter limit, embed the pieces in
    /// half-sized batches, and mean-combine them back into one vector.
    fn embed_resplit(&self, item: &str, limit: usize, depth: usize) -> Option<Vec<f32>> {
        let subs = split_text_by_token_limit(item, limit, &self.counter);
        let sub_batch = (self.config.max_batch_size / 2).max(1);
        let mut pieces: Vec<Option<Vec<f32>>> = Vec::with_capacity(subs.len());
        for chunk in subs.chunks(sub_batch) {
            pieces.extend(self.submit(chunk, limit, depth));
        }
        let present: Vec<&Vec<f32>> = pieces.iter().flatten().collect();
        mean_vector(&present)
    }

    fn record(&self, error: EmbeddingError, fallback: &str) {
        warn!(provider = self.provider.name(), error = %error, fallback, "embedding degraded");
        if let Ok(mut events) = self.events.lock() {
            events.push(DegradationEvent::new("embeddings", error.to_string(), fallback));
        }
    }

    /// Drain accumulated degradation events (for the ingestion failure
    /// report).
    pub fn drain_events(&self) -> Vec<DegradationEvent> {
        self.events.lock().map(|mut e| std::mem::take(&mut *e)).unwrap_or_default()
    }

    /// Dimension used for zero vectors before any call has succeeded.
    pub fn default_dimension(&self) -> usize {
        self.config.default_dimension
    }

    /// The active provider's name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

/// Element-wise arithmetic mean. `None` when the input is empty.
fn mean_vector(vectors: &[&Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    let mut sum = vec![0.0f64; dim];
    let mut n = 0usize;
    for v in vectors {
        if v.len() != dim {
            continue;
        }
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += *x as f64;
        }
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(sum.into_iter().map(|x| (x / n as f64) as f32).collect())
}
