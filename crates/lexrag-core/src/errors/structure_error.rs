/// Legal-structure subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    /// A document flagged as legal failed structural parsing; the caller
    /// falls back to generic chunking.
    #[error("no articles recognized in '{name}'")]
    ParseFailed { name: String },

    #[error("io error on structure file: {0}")]
    Io(#[from] std::io::Error),

    #[error("structure (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
