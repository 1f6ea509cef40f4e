//! HTTP rerank provider (SiliconFlow-style rerank endpoint).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use lexrag_core::config::RerankerConfig;
use lexrag_core::errors::RetrievalError;
use lexrag_core::traits::RerankProvider;

pub struct HttpReranker {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
    return_documents: bool,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

impl HttpReranker {
    pub fn new(cfg: &RerankerConfig) -> Result<Self, RetrievalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| RetrievalError::RerankFailed { reason: e.to_string() })?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

impl RerankProvider for HttpReranker {
    fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let request = RerankRequest {
            model: &self.model,
            query,
            documents,
            top_n: documents.len(),
            return_documents: false,
        };
        let mut builder = self.client.post(&self.base_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .map_err(|e| RetrievalError::RerankFailed { reason: e.to_string() })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RetrievalError::RerankFailed {
                reason: format!("HTTP {status}: {}", body.trim()),
            });
        }
        let parsed: RerankResponse = response
            .json()
            .map_err(|e| RetrievalError::RerankFailed { reason: format!("bad body: {e}") })?;

        // The provider returns results ranked by relevance; map them back
        // to input order, defaulting any omitted document to 0.
        let mut scores = vec![0.0f32; documents.len()];
        for result in parsed.results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.relevance_score;
            }
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        "http-reranker"
    }
}

/// Build the configured reranker; `None` config means no reranking pass.
pub fn create_reranker(
    cfg: Option<&RerankerConfig>,
) -> Result<Option<Box<dyn RerankProvider>>, RetrievalError> {
    match cfg {
        Some(cfg) if !cfg.model.is_empty() && !cfg.base_url.is_empty() => {
            Ok(Some(Box::new(HttpReranker::new(cfg)?)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_builds_nothing() {
        assert!(create_reranker(None).unwrap().is_none());
    }

    #[test]
    fn response_maps_back_to_input_order() {
        let raw = r#"{"results":[{"index":1,"relevance_score":0.9},{"index":0,"relevance_score":0.2}]}"#;
        let parsed: RerankResponse = serde_json::from_str(raw).unwrap();
        let mut scores = vec![0.0f32; 3];
        for r in parsed.results {
            scores[r.index] = r.relevance_score;
        }
        assert_eq!(scores, vec![0.2, 0.9, 0.0]);
    }

    #[test]
    fn request_serializes_expected_shape() {
        let docs = vec!["a".to_string()];
        let req = RerankRequest {
            model: "bge-reranker",
            query: "q",
            documents: &docs,
            top_n: 1,
            return_documents: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "bge-reranker");
        assert_eq!(json["documents"][0], "a");
        assert_eq!(json["return_documents"], false);
    }
}
