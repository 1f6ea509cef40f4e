use crate::models::TaskStatus;

/// Where the ingestion pipeline reports progress and polls for
/// cancellation.
///
/// Checked cooperatively at every per-file and per-batch boundary; an
/// implementation must tolerate concurrent readers (external pollers) and
/// one writer (the pipeline).
pub trait ProgressSink: Send + Sync {
    /// Record the task's current status. Implementations clamp `progress`
    /// into `0..=total`.
    fn update_progress(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: &str,
        progress: usize,
        total: usize,
    );

    /// Whether cancellation has been requested for the task.
    fn is_cancelled(&self, task_id: &str) -> bool;
}
