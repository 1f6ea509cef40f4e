//! The closed set of embedding provider variants.
//!
//! Selected once at construction from explicit configuration; call sites
//! only ever see the `EmbeddingProvider` trait.

mod ollama_http;
mod openai_http;

pub use ollama_http::OllamaProvider;
pub use openai_http::OpenAiCompatibleProvider;

use lexrag_core::config::{EmbeddingConfig, EmbeddingProviderKind};
use lexrag_core::errors::ConfigError;
use lexrag_core::traits::EmbeddingProvider;

/// Construct the configured provider variant.
pub fn create_provider(cfg: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, ConfigError> {
    if cfg.model.is_empty() || cfg.base_url.is_empty() {
        return Err(ConfigError::Invalid {
            reason: "embedding config needs both model and base_url".to_string(),
        });
    }
    Ok(match cfg.provider {
        EmbeddingProviderKind::OpenAiCompatible => Box::new(OpenAiCompatibleProvider::new(cfg)?),
        EmbeddingProviderKind::Ollama => Box::new(OllamaProvider::new(cfg)?),
    })
}
