//! Local Ollama embeddings endpoint (one request per item).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use lexrag_core::config::EmbeddingConfig;
use lexrag_core::errors::{ConfigError, EmbeddingError};
use lexrag_core::traits::EmbeddingProvider;

pub struct OllamaProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Vec<f32>,
}

impl OllamaProvider {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid { reason: format!("http client: {e}") })?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&OllamaRequest { model: &self.model, prompt: text })
            .send()
            .map_err(|e| EmbeddingError::Provider { reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Provider {
                reason: format!("HTTP {status}: {}", body.trim()),
            });
        }
        let parsed: OllamaResponse = response
            .json()
            .map_err(|e| EmbeddingError::Provider { reason: format!("bad response body: {e}") })?;
        Ok(parsed.embedding)
    }
}

impl EmbeddingProvider for OllamaProvider {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_body_parses() {
        let raw = r#"{"embedding":[0.1,0.2,0.3]}"#;
        let parsed: OllamaResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embedding.len(), 3);
    }

    #[test]
    fn request_body_shape() {
        let req = OllamaRequest { model: "bge-m3", prompt: "你好" };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "bge-m3");
        assert_eq!(json["prompt"], "你好");
    }
}
