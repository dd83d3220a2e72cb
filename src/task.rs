//! Failure-capturing task wrapper.
//!
//! A spawned tokio task that returns an error hands it back through its
//! `JoinHandle` exactly once; if nobody awaits the handle, the error is lost.
//! [`FailureCapturingTask`] keeps the captured result after the first join so
//! that every later join surfaces the same outcome.

use crate::error::{PreconditionViolation, TaskError};
use crate::work_item::{WorkArgs, WorkItem};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, info_span, warn};

/// Lifecycle of a task.
///
/// - `Created` -> `Running` (on `start()`)
/// - `Running` -> `Completed` (work-item returned `Ok`)
/// - `Running` -> `Failed` (work-item returned `Err` or panicked)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Created,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    /// Returns true once the work-item has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// Runs one work-item on its own execution unit and replays its result on join.
///
/// # Examples
///
/// ```ignore
/// let mut task = FailureCapturingTask::new(Arc::new(item), WorkArgs::new());
/// task.start()?;
/// task.join().await?;
/// ```
pub struct FailureCapturingTask {
    name: String,
    /// Work-item and arguments, taken when the task starts.
    pending: Option<(Arc<dyn WorkItem>, WorkArgs)>,
    handle: Option<JoinHandle<Result<(), TaskError>>>,
    captured: Option<Result<(), TaskError>>,
    state: Arc<watch::Sender<TaskState>>,
}

impl FailureCapturingTask {
    /// Creates a task in the `Created` state. Nothing runs until [`start`](Self::start).
    pub fn new(work_item: Arc<dyn WorkItem>, args: WorkArgs) -> Self {
        let (state, _) = watch::channel(TaskState::Created);
        Self {
            name: work_item.name().to_string(),
            pending: Some((work_item, args)),
            handle: None,
            captured: None,
            state: Arc::new(state),
        }
    }

    /// Name of the wrapped work-item.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// True once the work-item has finished.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// The error captured by a previous join, if any.
    pub fn captured_error(&self) -> Option<&TaskError> {
        self.captured.as_ref().and_then(|result| result.as_ref().err())
    }

    /// Spawns the work-item without blocking the caller.
    ///
    /// Must be called from within a tokio runtime. Starting twice is a defect:
    /// a task owns exactly one execution unit.
    pub fn start(&mut self) -> Result<(), PreconditionViolation> {
        let Some((work_item, args)) = self.pending.take() else {
            return Err(PreconditionViolation::AlreadyStarted {
                task: self.name.clone(),
            });
        };

        self.state.send_replace(TaskState::Running);
        let state = Arc::clone(&self.state);
        let name = self.name.clone();
        let span = info_span!("task", task = %self.name);

        self.handle = Some(tokio::spawn(
            async move {
                let result = run_guarded(&name, &*work_item, args).await;
                match &result {
                    Ok(()) => {
                        state.send_replace(TaskState::Completed);
                        debug!("Work item completed");
                    }
                    Err(err) => {
                        state.send_replace(TaskState::Failed);
                        debug!(error = %err, "Work item failed; error captured");
                    }
                }
                result
            }
            .instrument(span),
        ));

        Ok(())
    }

    /// Waits for the work-item to finish and surfaces its result.
    ///
    /// The first join awaits the execution unit and stores the result; every
    /// later join returns the stored result unchanged.
    pub async fn join(&mut self) -> Result<(), TaskError> {
        if let Some(captured) = &self.captured {
            return captured.clone();
        }

        let Some(handle) = self.handle.as_mut() else {
            return Err(PreconditionViolation::JoinBeforeStart {
                task: self.name.clone(),
            }
            .into());
        };

        // The handle stays in place until it resolves, so a dropped join can be retried.
        let joined = handle.await;
        self.handle = None;

        let result = match joined {
            Ok(result) => result,
            Err(join_err) => {
                self.state.send_replace(TaskState::Failed);
                Err(TaskError::Precondition(self.defect_from(join_err)))
            }
        };

        self.captured = Some(result.clone());
        result
    }

    fn defect_from(&self, join_err: JoinError) -> PreconditionViolation {
        if join_err.is_panic() {
            let message = panic_message(join_err.into_panic());
            warn!(task = %self.name, panic = %message, "Work item panicked");
            PreconditionViolation::WorkItemPanicked {
                task: self.name.clone(),
                message,
            }
        } else {
            warn!(task = %self.name, "Task aborted by the runtime");
            PreconditionViolation::Aborted {
                task: self.name.clone(),
            }
        }
    }
}

impl std::fmt::Debug for FailureCapturingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureCapturingTask")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("captured", &self.captured)
            .finish()
    }
}

/// Runs `work_item` on the current task, turning a panic into
/// [`PreconditionViolation::WorkItemPanicked`].
pub(crate) async fn run_guarded(
    name: &str,
    work_item: &dyn WorkItem,
    args: WorkArgs,
) -> Result<(), TaskError> {
    match AssertUnwindSafe(work_item.run(args)).catch_unwind().await {
        Ok(result) => result.map_err(TaskError::Failed),
        Err(payload) => {
            let message = panic_message(payload);
            warn!(task = %name, panic = %message, "Work item panicked");
            Err(PreconditionViolation::WorkItemPanicked {
                task: name.to_string(),
                message,
            }
            .into())
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
