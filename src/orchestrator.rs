//! Two-phase orchestrator.
//!
//! Runs the fixed sequence
//! `Start -> Validation -> SyncStep -> PostProcessing -> Success`, where any
//! work-item failure moves straight to `Failure`. Validation and
//! post-processing are phases of concurrent tasks; the sync step runs inline.
//! Work-item failures become an [`Outcome`]; precondition violations are
//! returned as errors and never folded into an outcome.

use crate::config::{PipelineConfig, StepName};
use crate::error::{PreconditionViolation, TaskError};
use crate::phase::{Phase, PhaseEntry};
use crate::progress::ProgressSink;
use crate::steps::SimulatedStep;
use crate::task::run_guarded;
use crate::work_item::{WorkArgs, WorkItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Confirmation text of a successful run.
pub const SUCCESS_MESSAGE: &str = "Api call was completed succesfully";

/// Terminal result of an orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { message: String },
    Failure { message: String },
}

impl Outcome {
    pub fn success() -> Self {
        Outcome::Success {
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message } | Outcome::Failure { message } => message,
        }
    }
}

/// States of the orchestrator's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrchestratorState {
    Start,
    /// Phase A: concurrent validations.
    Validation,
    /// The single synchronous step between the phases.
    SyncStep,
    /// Phase B: concurrent post-processing.
    PostProcessing,
    Success,
    Failure,
}

impl OrchestratorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorState::Start => "start",
            OrchestratorState::Validation => "validation",
            OrchestratorState::SyncStep => "sync_step",
            OrchestratorState::PostProcessing => "post_processing",
            OrchestratorState::Success => "success",
            OrchestratorState::Failure => "failure",
        }
    }

    /// Valid transitions out of this state.
    pub fn valid_next_states(&self) -> &'static [OrchestratorState] {
        use OrchestratorState::*;
        match self {
            Start => &[Validation, Failure],
            Validation => &[SyncStep, Failure],
            SyncStep => &[PostProcessing, Failure],
            PostProcessing => &[Success, Failure],
            Success | Failure => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrchestratorState) -> bool {
        self.valid_next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestratorState::Success | OrchestratorState::Failure)
    }
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records visited states and rejects illegal transitions.
#[derive(Debug)]
struct StateTrail {
    states: Vec<OrchestratorState>,
}

impl StateTrail {
    fn new() -> Self {
        Self {
            states: vec![OrchestratorState::Start],
        }
    }

    fn current(&self) -> OrchestratorState {
        self.states
            .last()
            .copied()
            .unwrap_or(OrchestratorState::Start)
    }

    fn advance(&mut self, next: OrchestratorState) -> Result<(), PreconditionViolation> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(PreconditionViolation::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %current, to = %next, "Orchestrator transition");
        self.states.push(next);
        Ok(())
    }
}

/// Outcome of a run together with the states it passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationReport {
    pub outcome: Outcome,
    /// Visited states, starting with `Start` and ending in a terminal state.
    pub states: Vec<OrchestratorState>,
}

impl OrchestrationReport {
    /// The state that was active when the run failed, if it failed.
    pub fn failed_during(&self) -> Option<OrchestratorState> {
        match self.states.as_slice() {
            [.., during, OrchestratorState::Failure] => Some(*during),
            _ => None,
        }
    }
}

/// The work-items the orchestrator runs, in order.
#[derive(Clone)]
pub struct Pipeline {
    validations: [Arc<dyn WorkItem>; 3],
    sync_step: Arc<dyn WorkItem>,
    post_processing: [Arc<dyn WorkItem>; 2],
}

impl Pipeline {
    pub fn new(
        validations: [Arc<dyn WorkItem>; 3],
        sync_step: Arc<dyn WorkItem>,
        post_processing: [Arc<dyn WorkItem>; 2],
    ) -> Self {
        Self {
            validations,
            sync_step,
            post_processing,
        }
    }

    /// The six placeholder steps, wired to `sink`.
    pub fn simulated(config: &PipelineConfig, sink: Arc<dyn ProgressSink>) -> Self {
        let step = |name: StepName| -> Arc<dyn WorkItem> {
            Arc::new(SimulatedStep::new(name, config, Arc::clone(&sink)))
        };
        Self::new(
            [
                step(StepName::Step1Validation),
                step(StepName::Step2Validation),
                step(StepName::Step3Validation),
            ],
            step(StepName::Step4Process),
            [step(StepName::Step5Process), step(StepName::Step6Process)],
        )
    }

    /// Names of all work-items in run order.
    pub fn step_names(&self) -> Vec<String> {
        self.validations
            .iter()
            .chain(std::iter::once(&self.sync_step))
            .chain(self.post_processing.iter())
            .map(|item| item.name().to_string())
            .collect()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

fn phase_entries(items: &[Arc<dyn WorkItem>], args: &WorkArgs) -> Vec<PhaseEntry> {
    items
        .iter()
        .map(|item| PhaseEntry::new(Arc::clone(item), args.clone()))
        .collect()
}

/// Runs a [`Pipeline`] and converts its result into an [`Outcome`].
///
/// # Examples
///
/// ```ignore
/// let orchestrator = Orchestrator::simulated(&PipelineConfig::new(), Arc::new(TracingSink));
/// let outcome = orchestrator.run(WorkArgs::new()).await?;
/// assert!(outcome.is_success());
/// ```
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pipeline: Pipeline,
}

impl Orchestrator {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Orchestrator over the placeholder steps.
    pub fn simulated(config: &PipelineConfig, sink: Arc<dyn ProgressSink>) -> Self {
        Self::new(Pipeline::simulated(config, sink))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs the pipeline and returns its outcome.
    pub async fn run(&self, args: WorkArgs) -> Result<Outcome, PreconditionViolation> {
        Ok(self.execute(args).await?.outcome)
    }

    /// Runs the pipeline and returns the outcome with the visited states.
    ///
    /// `args` is handed unchanged to every work-item.
    pub async fn execute(
        &self,
        args: WorkArgs,
    ) -> Result<OrchestrationReport, PreconditionViolation> {
        let span = info_span!("orchestrator");
        self.execute_in_span(args).instrument(span).await
    }

    async fn execute_in_span(
        &self,
        args: WorkArgs,
    ) -> Result<OrchestrationReport, PreconditionViolation> {
        let mut trail = StateTrail::new();
        let outcome = match self.drive(&mut trail, &args).await {
            Ok(()) => {
                trail.advance(OrchestratorState::Success)?;
                info!("Pipeline completed");
                Outcome::success()
            }
            Err(TaskError::Failed(err)) => {
                let during = trail.current();
                trail.advance(OrchestratorState::Failure)?;
                warn!(during = %during, error = %err, "Pipeline failed");
                Outcome::failure(err.message())
            }
            Err(TaskError::Precondition(violation)) => {
                error!(error = %violation, "Precondition violation during pipeline run");
                return Err(violation);
            }
        };

        Ok(OrchestrationReport {
            outcome,
            states: trail.states,
        })
    }

    async fn drive(&self, trail: &mut StateTrail, args: &WorkArgs) -> Result<(), TaskError> {
        trail.advance(OrchestratorState::Validation)?;
        Phase::new(
            OrchestratorState::Validation.as_str(),
            phase_entries(&self.pipeline.validations, args),
        )
        .run()
        .await?;

        trail.advance(OrchestratorState::SyncStep)?;
        let sync_step: &dyn WorkItem = &*self.pipeline.sync_step;
        debug!(step = %sync_step.name(), "Running synchronous step");
        run_guarded(sync_step.name(), sync_step, args.clone()).await?;

        trail.advance(OrchestratorState::PostProcessing)?;
        Phase::new(
            OrchestratorState::PostProcessing.as_str(),
            phase_entries(&self.pipeline.post_processing, args),
        )
        .run()
        .await?;

        Ok(())
    }
}
