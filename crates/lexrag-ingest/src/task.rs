//! Shared task-progress store.
//!
//! An explicitly owned, injected store (no ambient global state): the
//! pipeline writes progress into it, external callers poll it, and
//! cancellation flows back through it.

use dashmap::DashMap;
use uuid::Uuid;

use lexrag_core::models::{ProcessingTask, TaskStatus};
use lexrag_core::traits::ProgressSink;

#[derive(Default)]
pub struct TaskStore {
    tasks: DashMap<String, ProcessingTask>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task and return its id.
    pub fn create_task(&self) -> String {
        let task_id = Uuid::new_v4().to_string();
        self.tasks.insert(task_id.clone(), ProcessingTask::new(&task_id));
        task_id
    }

    /// Snapshot of one task, for pollers.
    pub fn get(&self, task_id: &str) -> Option<ProcessingTask> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    /// Request cancellation. Only non-terminal tasks can be cancelled;
    /// returns whether the request took effect.
    pub fn cancel(&self, task_id: &str) -> bool {
        match self.tasks.get_mut(task_id) {
            Some(mut task) if !task.status.is_terminal() => {
                task.status = TaskStatus::Cancelled;
                task.message = "任务已取消".to_string();
                task.updated_at = chrono::Utc::now();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl ProgressSink for TaskStore {
    fn update_progress(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: &str,
        progress: usize,
        total: usize,
    ) {
        let Some(mut task) = self.tasks.get_mut(task_id) else { return };
        // A cancelled task stays cancelled; late pipeline updates must not
        // resurrect it.
        if task.status == TaskStatus::Cancelled && status != TaskStatus::Cancelled {
            return;
        }
        let total = total.max(1);
        let mut progress = progress.min(total);
        if status == TaskStatus::Completed {
            progress = total;
        }
        task.status = status;
        task.message = message.to_string();
        task.progress = progress;
        task.total = total;
        task.updated_at = chrono::Utc::now();
    }

    fn is_cancelled(&self, task_id: &str) -> bool {
        self.tasks
            .get(task_id)
            .map(|t| t.status == TaskStatus::Cancelled)
            .unwrap_or(false)
    }
}
