//! 'parallel-validation' - concurrent validation steps with deterministic failure reporting.
//!
//! The crate runs a fixed pipeline: three validations in parallel, one
//! synchronous step, then two post-processing steps in parallel. Each
//! concurrently running work-item is wrapped in a [`FailureCapturingTask`],
//! which keeps the work-item's error and surfaces it when the task is joined.
//! Phases join their tasks in creation order, so the reported failure is
//! always the earliest-created failing task, regardless of timing.
//!
//! The caller-facing result is a plain value: [`Outcome`] from the
//! orchestrator, or the two-field [`ApiResponse`] from [`main_api_handler`].

pub mod config;
pub mod error;
pub mod handler;
pub mod observability;
pub mod orchestrator;
pub mod phase;
pub mod progress;
pub mod steps;
pub mod task;
pub mod work_item;

pub use config::{FAIL_TEST_KEY, FailurePoint, PipelineConfig, StepName};
pub use error::{PreconditionViolation, TaskError, WorkItemError};
pub use handler::{ApiHandler, ApiRequest, ApiResponse, main_api_handler};
pub use orchestrator::{
    OrchestrationReport, Orchestrator, OrchestratorState, Outcome, Pipeline, SUCCESS_MESSAGE,
};
pub use phase::{Phase, PhaseEntry, run_phase};
pub use progress::{MemorySink, ProgressEvent, ProgressKind, ProgressSink, TracingSink};
pub use steps::SimulatedStep;
pub use task::{FailureCapturingTask, TaskState};
pub use work_item::{FnWorkItem, NamedArgs, WorkArgs, WorkItem, work_item_fn};
