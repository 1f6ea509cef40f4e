/// Ingestion subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Cooperative cancellation observed at a checkpoint; the pipeline
    /// returns cleanly without persisting partial batches.
    #[error("task {task_id} was cancelled")]
    Cancelled { task_id: String },

    #[error("unknown task '{task_id}'")]
    TaskNotFound { task_id: String },

    #[error("extraction failed for '{file}': {reason}")]
    Extraction { file: String, reason: String },
}
