//! # lexrag-core
//!
//! Foundation crate for the lexrag pipeline.
//! Defines the chunk data model, law structures, task lifecycle, provider
//! traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod chunk;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use chunk::{Chunk, ContentType, HeaderMeta};
pub use config::RagConfig;
pub use errors::{RagError, RagResult};
pub use models::{LawStructure, ProcessingTask, QueryInfo, TaskStatus};
