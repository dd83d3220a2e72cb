//! Error types for tasks, phases and the orchestrator.
//!
//! Two kinds of error cross the task boundary:
//! - [`WorkItemError`]: the work-item itself reported a failure. Recoverable at the
//!   orchestrator, which turns it into a `Failure` outcome.
//! - [`PreconditionViolation`]: the coordination API was misused, or a work-item
//!   panicked. These are defects and are never folded into an outcome.

use thiserror::Error;

/// A failure reported by a work-item's own logic.
///
/// Displays as the bare message so callers can surface it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WorkItemError {
    message: String,
}

impl WorkItemError {
    /// Creates a new work-item error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A programming defect detected while coordinating tasks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    /// `join()` was called on a task that was never started.
    #[error("task '{task}' was joined before it was started")]
    JoinBeforeStart { task: String },

    /// `start()` was called on a task that already owns an execution unit.
    #[error("task '{task}' was started more than once")]
    AlreadyStarted { task: String },

    /// The work-item panicked instead of returning an error.
    #[error("work item '{task}' panicked: {message}")]
    WorkItemPanicked { task: String, message: String },

    /// The runtime cancelled the execution unit before it finished.
    #[error("task '{task}' was aborted before completing")]
    Aborted { task: String },

    /// The orchestrator was driven through an illegal state transition.
    #[error("invalid orchestrator transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// The error surfaced by joining a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The work-item failed; carries its captured error.
    #[error(transparent)]
    Failed(#[from] WorkItemError),

    /// The task was misused or its work-item panicked.
    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),
}

impl TaskError {
    /// Returns true if this error is a defect rather than a work-item failure.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, TaskError::Precondition(_))
    }

    /// Returns the captured work-item error, if this is one.
    pub fn work_item_error(&self) -> Option<&WorkItemError> {
        match self {
            TaskError::Failed(err) => Some(err),
            TaskError::Precondition(_) => None,
        }
    }
}
