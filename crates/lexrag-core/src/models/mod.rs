//! Shared model types exchanged between pipeline components.

mod failure;
mod generation;
mod law_structure;
mod query;
mod task;

pub use failure::{DegradationEvent, FailureReport};
pub use generation::{Generation, Message, Role};
pub use law_structure::{ArticleInfo, ChapterInfo, LawStructure};
pub use query::{NumberRef, QueryInfo};
pub use task::{ProcessingTask, TaskStatus};
