//! Pipeline configuration and step identifiers.
//!
//! The only behavioural knob is the failure hook: which placeholder step should
//! simulate a failure. The simulated latency bound exists so tests can run the
//! real pipeline without multi-second sleeps.

use crate::work_item::NamedArgs;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::warn;

/// The reserved named argument that selects a step to fail.
pub const FAIL_TEST_KEY: &str = "fail_test";

/// Default upper bound (exclusive) for the simulated latency of validations 1 and 2.
pub const DEFAULT_MAX_SIMULATED_LATENCY: Duration = Duration::from_secs(5);

/// Identifies each of the six pipeline steps.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum StepName {
    #[serde(rename = "step1_validation")]
    #[strum(serialize = "step1_validation")]
    Step1Validation,
    #[serde(rename = "step2_validation")]
    #[strum(serialize = "step2_validation")]
    Step2Validation,
    #[serde(rename = "step3_validation")]
    #[strum(serialize = "step3_validation")]
    Step3Validation,
    #[serde(rename = "step4_process")]
    #[strum(serialize = "step4_process")]
    Step4Process,
    #[serde(rename = "step5_process")]
    #[strum(serialize = "step5_process")]
    Step5Process,
    #[serde(rename = "step6_process")]
    #[strum(serialize = "step6_process")]
    Step6Process,
}

/// The steps the failure hook may target.
///
/// The synchronous step 4 has no failure hook.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum FailurePoint {
    #[serde(rename = "step1_validation")]
    #[strum(serialize = "step1_validation")]
    Step1Validation,
    #[serde(rename = "step2_validation")]
    #[strum(serialize = "step2_validation")]
    Step2Validation,
    #[serde(rename = "step3_validation")]
    #[strum(serialize = "step3_validation")]
    Step3Validation,
    #[serde(rename = "step5_process")]
    #[strum(serialize = "step5_process")]
    Step5Process,
    #[serde(rename = "step6_process")]
    #[strum(serialize = "step6_process")]
    Step6Process,
}

impl FailurePoint {
    /// The step this hook value targets.
    pub fn step(&self) -> StepName {
        match self {
            FailurePoint::Step1Validation => StepName::Step1Validation,
            FailurePoint::Step2Validation => StepName::Step2Validation,
            FailurePoint::Step3Validation => StepName::Step3Validation,
            FailurePoint::Step5Process => StepName::Step5Process,
            FailurePoint::Step6Process => StepName::Step6Process,
        }
    }
}

/// Configuration for one pipeline run.
///
/// # Examples
///
/// ```ignore
/// use parallel_validation::config::{FailurePoint, PipelineConfig};
/// use std::time::Duration;
///
/// let config = PipelineConfig::new()
///     .with_fail_at(FailurePoint::Step5Process)
///     .with_max_simulated_latency(Duration::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Step that should simulate a failure, if any.
    #[serde(default)]
    pub fail_at: Option<FailurePoint>,

    /// Exclusive upper bound for the random delay of validations 1 and 2,
    /// in whole seconds. `Duration::ZERO` disables the delay.
    #[serde(default = "default_max_simulated_latency")]
    pub max_simulated_latency: Duration,
}

fn default_max_simulated_latency() -> Duration {
    DEFAULT_MAX_SIMULATED_LATENCY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Creates a configuration with no failure hook and the default latency bound.
    pub fn new() -> Self {
        Self {
            fail_at: None,
            max_simulated_latency: DEFAULT_MAX_SIMULATED_LATENCY,
        }
    }

    /// Reads the failure hook from the reserved `fail_test` named argument.
    ///
    /// Values that do not name a hookable step are ignored.
    pub fn from_named_args(named: &NamedArgs) -> Self {
        let fail_at = named.get(FAIL_TEST_KEY).and_then(|value| {
            let parsed = value
                .as_str()
                .and_then(|name| FailurePoint::from_str(name).ok());
            if parsed.is_none() {
                warn!(value = %value, "Ignoring unrecognised {} value", FAIL_TEST_KEY);
            }
            parsed
        });

        Self {
            fail_at,
            ..Self::new()
        }
    }

    pub fn with_fail_at(mut self, point: FailurePoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    pub fn without_failure(mut self) -> Self {
        self.fail_at = None;
        self
    }

    pub fn with_max_simulated_latency(mut self, bound: Duration) -> Self {
        self.max_simulated_latency = bound;
        self
    }

    /// True if `step` is the configured failure point.
    pub fn should_fail(&self, step: StepName) -> bool {
        self.fail_at.is_some_and(|point| point.step() == step)
    }
}
