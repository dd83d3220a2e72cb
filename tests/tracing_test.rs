//! Tracing tests for the phase runner and orchestrator
//!
//! These tests verify that structured tracing events are emitted during a
//! pipeline run, including the early return of a phase at its first failure.

mod common;

use common::{LogCapture, MockItem};
use parallel_validation::{
    FailurePoint, MemorySink, Orchestrator, PhaseEntry, PipelineConfig, TracingSink, WorkArgs,
    run_phase,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

// ============================================================================
// Tests
// ============================================================================

// Current-thread runtime: spawned tasks log through the thread-local subscriber.
#[tokio::test]
async fn test_early_return_is_logged() {
    let (logs, _guard) = LogCapture::install(Level::DEBUG);

    let first = MockItem::new("first").failing("first failed");
    let second = MockItem::new("second").failing("second failed");
    let result = run_phase(
        "logged",
        vec![
            PhaseEntry::new(first.shared(), WorkArgs::new()),
            PhaseEntry::new(second.shared(), WorkArgs::new()),
        ],
    )
    .await;

    assert_eq!(result.unwrap_err().to_string(), "first failed");
    let output = logs.contents();
    assert!(output.contains("Stopping at first failed join"), "{output}");
    assert!(output.contains("unjoined=1"), "{output}");
    assert!(output.contains("phase=logged"), "{output}");
}

#[tokio::test]
async fn test_orchestrator_logs_failure_state() {
    let (logs, _guard) = LogCapture::install(Level::INFO);

    let config = PipelineConfig::new()
        .with_fail_at(FailurePoint::Step5Process)
        .with_max_simulated_latency(Duration::ZERO);
    let orchestrator = Orchestrator::simulated(&config, Arc::new(TracingSink));
    let outcome = orchestrator.run(WorkArgs::new()).await.unwrap();

    assert!(!outcome.is_success());
    let output = logs.contents();
    assert!(output.contains("Pipeline failed"), "{output}");
    assert!(output.contains("during=post_processing"), "{output}");
    assert!(output.contains("step4_process completed"), "{output}");
}

#[tokio::test]
async fn test_memory_sink_keeps_progress_out_of_logs() {
    let (logs, _guard) = LogCapture::install(Level::INFO);

    let sink = Arc::new(MemorySink::new());
    let config = PipelineConfig::new().with_max_simulated_latency(Duration::ZERO);
    Orchestrator::simulated(&config, sink.clone())
        .run(WorkArgs::new())
        .await
        .unwrap();

    let output = logs.contents();
    assert!(output.contains("Pipeline completed"), "{output}");
    assert!(!output.contains("step4_process completed"), "{output}");
    assert_eq!(sink.completed_messages().len(), 6);
}
