//! Phase runner: start a group of tasks together, join them in creation order.
//!
//! Join order decides which failure is reported. When several tasks fail, the
//! error of the earliest-created one wins, no matter which finished first, and
//! the runner returns as soon as that join fails.

use crate::error::{PreconditionViolation, TaskError};
use crate::task::{FailureCapturingTask, TaskState};
use crate::work_item::{WorkArgs, WorkItem};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span};

/// One work-item together with the arguments it will be called with.
#[derive(Clone)]
pub struct PhaseEntry {
    pub work_item: Arc<dyn WorkItem>,
    pub args: WorkArgs,
}

impl PhaseEntry {
    pub fn new(work_item: Arc<dyn WorkItem>, args: WorkArgs) -> Self {
        Self { work_item, args }
    }
}

impl std::fmt::Debug for PhaseEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseEntry")
            .field("work_item", &self.work_item.name())
            .field("args", &self.args)
            .finish()
    }
}

/// An ordered batch of tasks that are started together.
///
/// The phase owns its tasks; none of them outlives it.
#[derive(Debug)]
pub struct Phase {
    name: String,
    tasks: Vec<FailureCapturingTask>,
}

impl Phase {
    /// Creates one task per entry, in entry order.
    pub fn new(name: impl Into<String>, entries: Vec<PhaseEntry>) -> Self {
        let tasks = entries
            .into_iter()
            .map(|entry| FailureCapturingTask::new(entry.work_item, entry.args))
            .collect();
        Self {
            name: name.into(),
            tasks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tasks in creation order.
    pub fn tasks(&self) -> &[FailureCapturingTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// True when every task has reached `Completed` or `Failed`.
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(FailureCapturingTask::is_finished)
    }

    /// States of all tasks in creation order.
    pub fn task_states(&self) -> Vec<(String, TaskState)> {
        self.tasks
            .iter()
            .map(|task| (task.name().to_string(), task.state()))
            .collect()
    }

    /// Starts every task. All tasks are started before any is joined.
    pub fn start_all(&mut self) -> Result<(), PreconditionViolation> {
        for task in &mut self.tasks {
            task.start()?;
        }
        debug!(phase = %self.name, tasks = self.tasks.len(), "All tasks started");
        Ok(())
    }

    /// Joins tasks in creation order, stopping at the first join that fails.
    ///
    /// Tasks after the failing one are not joined. Their work-items keep running
    /// to completion, and any failure they produce is never reported.
    pub async fn join_all(&mut self) -> Result<(), TaskError> {
        let total = self.tasks.len();
        for (index, task) in self.tasks.iter_mut().enumerate() {
            if let Err(err) = task.join().await {
                let unjoined = total - index - 1;
                if unjoined > 0 {
                    debug!(
                        phase = %self.name,
                        task = %task.name(),
                        unjoined,
                        "Stopping at first failed join; remaining tasks left running"
                    );
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Starts all tasks and joins them.
    pub async fn run(&mut self) -> Result<(), TaskError> {
        let span = info_span!("phase", phase = %self.name);
        self.run_in_span().instrument(span).await
    }

    async fn run_in_span(&mut self) -> Result<(), TaskError> {
        info!(tasks = self.tasks.len(), "Starting phase");
        self.start_all()?;
        let result = self.join_all().await;
        match &result {
            Ok(()) => info!("Phase completed"),
            Err(err) => info!(error = %err, "Phase failed"),
        }
        result
    }
}

/// Builds a phase from `entries` and runs it to completion.
pub async fn run_phase(name: impl Into<String>, entries: Vec<PhaseEntry>) -> Result<(), TaskError> {
    Phase::new(name, entries).run().await
}
