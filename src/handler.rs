//! Request/response adapter around the orchestrator.

use crate::config::{FAIL_TEST_KEY, PipelineConfig};
use crate::orchestrator::{Orchestrator, Outcome};
use crate::progress::{ProgressSink, TracingSink};
use crate::work_item::{NamedArgs, WorkArgs};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Incoming call: positional and named arguments.
///
/// The reserved named argument `fail_test` selects a step to fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    #[serde(default)]
    pub args: Vec<JsonValue>,
    #[serde(default)]
    pub kwargs: NamedArgs,
}

impl ApiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that forces `step` to fail.
    pub fn failing_at(step: impl Into<String>) -> Self {
        let step: String = step.into();
        Self::new().with_kwarg(FAIL_TEST_KEY, step)
    }

    pub fn with_arg(mut self, value: impl Into<JsonValue>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// The two-field response returned for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl From<Outcome> for ApiResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success { message } => ApiResponse {
                success: true,
                message,
            },
            Outcome::Failure { message } => ApiResponse {
                success: false,
                message,
            },
        }
    }
}

/// Handles requests by running the placeholder pipeline.
#[derive(Clone)]
pub struct ApiHandler {
    sink: Arc<dyn ProgressSink>,
    max_simulated_latency: Duration,
}

impl Default for ApiHandler {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl ApiHandler {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            max_simulated_latency: PipelineConfig::new().max_simulated_latency,
        }
    }

    pub fn with_max_simulated_latency(mut self, bound: Duration) -> Self {
        self.max_simulated_latency = bound;
        self
    }

    /// Builds the run configuration for `request`.
    pub fn config_for(&self, request: &ApiRequest) -> PipelineConfig {
        PipelineConfig::from_named_args(&request.kwargs)
            .with_max_simulated_latency(self.max_simulated_latency)
    }

    /// Runs the pipeline for `request`.
    ///
    /// # Panics
    ///
    /// Panics on a precondition violation (a coordination defect or a panicking
    /// work-item). Work-item failures never panic; they come back as
    /// `success: false`.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let config = self.config_for(&request);
        info!(
            fail_at = ?config.fail_at,
            args = request.args.len(),
            kwargs = request.kwargs.len(),
            "Handling request"
        );

        let orchestrator = Orchestrator::simulated(&config, Arc::clone(&self.sink));
        let args = WorkArgs::from_parts(request.args, request.kwargs);
        match orchestrator.run(args).await {
            Ok(outcome) => outcome.into(),
            Err(violation) => {
                error!(error = %violation, "Fatal precondition violation");
                panic!("fatal precondition violation: {violation}");
            }
        }
    }
}

impl std::fmt::Debug for ApiHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandler")
            .field("max_simulated_latency", &self.max_simulated_latency)
            .finish_non_exhaustive()
    }
}

/// Handles `request` with progress logged through `tracing`.
///
/// # Panics
///
/// See [`ApiHandler::handle`].
pub async fn main_api_handler(request: ApiRequest) -> ApiResponse {
    ApiHandler::default().handle(request).await
}
