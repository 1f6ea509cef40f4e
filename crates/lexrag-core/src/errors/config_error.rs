/// Configuration errors: the only class surfaced to users as fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no embedding provider configured")]
    MissingEmbeddingProvider,

    #[error("no generation provider configured")]
    MissingGenerationProvider,

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
