use crate::metrics::SyncMetrics;
use crate::models::CopyTask;
use crate::services::copier::TaskExecutor;
use crate::state::StateManager;

/// Aggregate outcome of running a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks_run: usize,
    /// Tasks that could not run at all
    pub tasks_failed: usize,
    /// Files and archive entries written
    pub files_written: usize,
    /// Recoverable errors, task-level and per-file
    pub errors: usize,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Ordered list of deferred copy tasks.
///
/// Tasks run in the order they were queued. Two tasks writing the same file
/// name are not merged; the later one overwrites.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<CopyTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, task: CopyTask) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[CopyTask] {
        &self.tasks
    }

    /// Drop all queued tasks.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Run every task one after another, then leave the queue empty.
    ///
    /// A failing task is logged, recorded in `state` and skipped; it never stops
    /// the tasks after it. Panics are not caught.
    pub fn run_all(
        &mut self,
        executor: &dyn TaskExecutor,
        state: &StateManager,
        metrics: &SyncMetrics,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for (index, task) in self.tasks.drain(..).enumerate() {
            let label = task.to_string();
            state.task_started(label.clone(), index);
            summary.tasks_run += 1;

            match executor.execute(&task) {
                Ok(report) => {
                    summary.files_written += report.written;
                    for error in &report.errors {
                        summary.errors += 1;
                        metrics.record_error();
                        state.record_error(error.to_string());
                    }
                    metrics.record_task_completed();
                    state.task_finished(label, true);
                }
                Err(e) => {
                    tracing::error!("Failed to process {}: {}", label, e);
                    summary.tasks_failed += 1;
                    summary.errors += 1;
                    metrics.record_task_failed();
                    metrics.record_error();
                    state.record_error(e.to_string());
                    state.task_finished(label, false);
                }
            }
        }

        summary
    }
}
