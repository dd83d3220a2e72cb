//! Placeholder work-items for the six pipeline steps.
//!
//! Validations 1 and 2 stand in for I/O-bound checks and sleep for a random
//! number of whole seconds; the rest finish immediately. Any hookable step fails
//! when the configuration names it.

use crate::config::{PipelineConfig, StepName};
use crate::error::WorkItemError;
use crate::progress::{ProgressEvent, ProgressKind, ProgressSink};
use crate::work_item::{WorkArgs, WorkItem};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// A placeholder step that sleeps, reports progress, and optionally fails.
pub struct SimulatedStep {
    step: StepName,
    fail: bool,
    max_latency: Duration,
    sink: Arc<dyn ProgressSink>,
}

impl SimulatedStep {
    pub fn new(step: StepName, config: &PipelineConfig, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            step,
            fail: config.should_fail(step),
            max_latency: config.max_simulated_latency,
            sink,
        }
    }

    pub fn step(&self) -> StepName {
        self.step
    }

    /// Whole seconds to sleep, for the steps that simulate I/O.
    fn draw_delay(&self) -> Option<u64> {
        match self.step {
            StepName::Step1Validation | StepName::Step2Validation => {
                let bound = self.max_latency.as_secs();
                if bound == 0 {
                    Some(0)
                } else {
                    Some(rand::thread_rng().gen_range(0..bound))
                }
            }
            _ => None,
        }
    }

    fn report(&self, kind: ProgressKind, message: impl Into<String>) {
        self.sink
            .report(ProgressEvent::new(self.step.to_string(), kind, message));
    }
}

fn completion_message(step: StepName, delay: Option<u64>) -> String {
    match (step, delay) {
        (StepName::Step1Validation, Some(secs)) => {
            format!("step 1 validation completed in {secs} seconds")
        }
        (StepName::Step2Validation, Some(secs)) => {
            format!("step 2 validation completed in {secs} seconds")
        }
        (StepName::Step3Validation, _) => "step 3 validation completed without delay".to_string(),
        (other, _) => format!("{other} completed"),
    }
}

fn failure_message(step: StepName, delay: Option<u64>) -> String {
    match (step, delay) {
        (StepName::Step1Validation, Some(secs)) => {
            format!("Step 1 validation failed in {secs} seconds")
        }
        (StepName::Step2Validation, Some(secs)) => {
            format!("Step 2 validation failed in {secs} seconds")
        }
        (StepName::Step3Validation, _) => "Step 3 validation failed without delay".to_string(),
        (StepName::Step5Process, _) => "Step 5 process failed without delay".to_string(),
        (StepName::Step6Process, _) => "Step 6 process failed without delay".to_string(),
        (other, _) => format!("{other} failed"),
    }
}

#[async_trait]
impl WorkItem for SimulatedStep {
    fn name(&self) -> &str {
        self.step.as_ref()
    }

    async fn run(&self, args: WorkArgs) -> Result<(), WorkItemError> {
        trace!(
            step = %self.step,
            positional = args.positional.len(),
            named = args.named.len(),
            "Running simulated step"
        );
        self.report(ProgressKind::Started, format!("{} started", self.step));

        let delay = self.draw_delay();
        if let Some(secs) = delay.filter(|secs| *secs > 0) {
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }

        if self.fail {
            let message = failure_message(self.step, delay);
            self.report(ProgressKind::Failed, message.clone());
            return Err(WorkItemError::new(message));
        }

        self.report(ProgressKind::Completed, completion_message(self.step, delay));
        Ok(())
    }
}
