//! Integration tests for the API handler
//!
//! These tests run the placeholder pipeline end to end through the handler,
//! using a MemorySink as a call-count side channel.

use parallel_validation::{
    ApiHandler, ApiRequest, ApiResponse, FailurePoint, MemorySink, ProgressKind, StepName,
    main_api_handler,
};
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;

fn instant_handler(sink: Arc<MemorySink>) -> ApiHandler {
    ApiHandler::new(sink).with_max_simulated_latency(Duration::ZERO)
}

fn started(sink: &MemorySink, step: StepName) -> usize {
    sink.started_count(&step.to_string())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_hook_succeeds() {
    let sink = Arc::new(MemorySink::new());
    let response = instant_handler(sink.clone()).handle(ApiRequest::new()).await;

    assert_eq!(
        response,
        ApiResponse {
            success: true,
            message: "Api call was completed succesfully".to_string(),
        }
    );
    for step in StepName::iter() {
        assert_eq!(started(&sink, step), 1, "{step} should run once");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_step3_hook_skips_post_processing() {
    let sink = Arc::new(MemorySink::new());
    let response = instant_handler(sink.clone())
        .handle(ApiRequest::failing_at("step3_validation"))
        .await;

    assert_eq!(
        response,
        ApiResponse {
            success: false,
            message: "Step 3 validation failed without delay".to_string(),
        }
    );
    assert_eq!(started(&sink, StepName::Step4Process), 0);
    assert_eq!(started(&sink, StepName::Step5Process), 0);
    assert_eq!(started(&sink, StepName::Step6Process), 0);
    // The sibling validations still ran to completion.
    assert_eq!(sink.count("step1_validation", ProgressKind::Completed), 1);
    assert_eq!(sink.count("step2_validation", ProgressKind::Completed), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_validation_hooks_report_timed_messages() {
    for (hook, expected) in [
        ("step1_validation", "Step 1 validation failed in 0 seconds"),
        ("step2_validation", "Step 2 validation failed in 0 seconds"),
    ] {
        let sink = Arc::new(MemorySink::new());
        let response = instant_handler(sink.clone())
            .handle(ApiRequest::failing_at(hook))
            .await;

        assert!(!response.success);
        assert_eq!(response.message, expected);
        assert_eq!(started(&sink, StepName::Step4Process), 0);
        assert_eq!(started(&sink, StepName::Step5Process), 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_processing_hook_runs_earlier_stages() {
    for (hook, expected) in [
        ("step5_process", "Step 5 process failed without delay"),
        ("step6_process", "Step 6 process failed without delay"),
    ] {
        let sink = Arc::new(MemorySink::new());
        let response = instant_handler(sink.clone())
            .handle(ApiRequest::failing_at(hook))
            .await;

        assert_eq!(
            response,
            ApiResponse {
                success: false,
                message: expected.to_string(),
            }
        );
        for step in [
            StepName::Step1Validation,
            StepName::Step2Validation,
            StepName::Step3Validation,
            StepName::Step4Process,
        ] {
            assert_eq!(sink.count(&step.to_string(), ProgressKind::Completed), 1);
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_hook_produces_failure() {
    for point in FailurePoint::iter() {
        let sink = Arc::new(MemorySink::new());
        let response = instant_handler(sink.clone())
            .handle(ApiRequest::failing_at(point.to_string()))
            .await;

        assert!(!response.success, "{point} should fail");
        assert_eq!(sink.count(&point.to_string(), ProgressKind::Failed), 1);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unrecognised_hook_is_ignored() {
    for hook in ["step4_process", "not_a_step"] {
        let sink = Arc::new(MemorySink::new());
        let response = instant_handler(sink)
            .handle(ApiRequest::failing_at(hook))
            .await;
        assert!(response.success, "{hook} should not force a failure");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_extra_arguments_are_accepted() {
    let sink = Arc::new(MemorySink::new());
    let request = ApiRequest::new()
        .with_arg("payload")
        .with_arg(42)
        .with_kwarg("user", "alice")
        .with_kwarg("fail_test", "step6_process");

    let response = instant_handler(sink).handle(request).await;
    assert_eq!(response.message, "Step 6 process failed without delay");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_main_api_handler_with_default_latency() {
    // Step 3 fails without delay; validations 1 and 2 may still sleep up to 4s.
    let response = main_api_handler(ApiRequest::failing_at("step3_validation")).await;
    assert_eq!(
        response,
        ApiResponse {
            success: false,
            message: "Step 3 validation failed without delay".to_string(),
        }
    );
}
