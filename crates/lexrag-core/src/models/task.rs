//! Ingestion task lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a background ingestion task.
///
/// `Completed`, `Error` and `Cancelled` are terminal; a task is never
/// retried automatically once it reaches one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Initializing,
    Processing,
    Embedding,
    Completed,
    Error,
    Cancelled,
}

impl TaskStatus {
    /// Whether the task can still make progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error | TaskStatus::Cancelled)
    }
}

/// Progress record of one ingestion run, polled by external callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingTask {
    pub task_id: String,
    pub status: TaskStatus,
    /// Units completed so far; meaning depends on the current phase
    /// (files during processing, chunks during embedding).
    pub progress: usize,
    /// Total units for the current phase; at least 1 once known.
    pub total: usize,
    /// Human-readable status line.
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingTask {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Initializing,
            progress: 0,
            total: 0,
            message: String::new(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
        assert!(!TaskStatus::Embedding.is_terminal());
        assert!(!TaskStatus::Initializing.is_terminal());
    }
}
