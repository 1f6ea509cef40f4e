use crate::errors::RagResult;
use crate::models::{Generation, Message};

/// The external chat-completion provider. The pipeline only builds prompts
/// and hands them over; the call itself is a collaborator concern.
pub trait GenerationProvider: Send + Sync {
    fn generate(&self, messages: &[Message]) -> RagResult<Generation>;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
