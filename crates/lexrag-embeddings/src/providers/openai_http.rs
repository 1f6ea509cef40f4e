//! OpenAI-compatible batch embeddings endpoint.
//!
//! Covers OpenAI itself and the drop-in compatible services (SiliconFlow,
//! vLLM, …). Provider pushback is classified into the structured errors the
//! engine reacts to: token-limit rejections and batch-size rejections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use lexrag_core::config::EmbeddingConfig;
use lexrag_core::errors::{ConfigError, EmbeddingError};
use lexrag_core::traits::EmbeddingProvider;

pub struct OpenAiCompatibleProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    token_limit: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
    model: &'a str,
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiCompatibleProvider {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid { reason: format!("http client: {e}") })?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            token_limit: cfg.max_token_limit,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

impl EmbeddingProvider for OpenAiCompatibleProvider {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingsRequest {
            input: texts,
            model: &self.model,
            encoding_format: "float",
        };
        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .map_err(|e| EmbeddingError::Provider { reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_rejection(
                status.as_u16(),
                &body,
                texts.len(),
                self.token_limit,
            ));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .map_err(|e| EmbeddingError::Provider { reason: format!("bad response body: {e}") })?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: parsed.data.len(),
            });
        }
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

/// Map a provider rejection onto the structured errors the engine can react
/// to. Providers word these differently; matching on the known phrasings
/// plus the 413 status covers the compatible services in use.
fn classify_rejection(status: u16, body: &str, batch_len: usize, token_limit: usize) -> EmbeddingError {
    let lower = body.to_lowercase();
    if lower.contains("maximum allowed batch size") || lower.contains("batch size") {
        return EmbeddingError::BatchTooLarge { size: batch_len };
    }
    if (lower.contains("token") && (lower.contains("less than") || lower.contains("limit")))
        || lower.contains("input is too long")
    {
        return EmbeddingError::TokenLimit { limit: token_limit };
    }
    if status == 413 {
        return EmbeddingError::BatchTooLarge { size: batch_len };
    }
    let reason: String = body.trim().chars().take(200).collect();
    EmbeddingError::Provider { reason: format!("HTTP {status}: {reason}") }
}
