//! BDD step definitions for verifier behaviour.

use rstest_bdd_macros::{given, then, when};
use stagewatch::{FailureKind, StatusProgressionVerifier};

use super::test_helpers::{VerificationOutcome, VerifierContext, build_stage, split_statuses};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn failure_kind(verifier_context: &VerifierContext) -> Result<FailureKind, StepError> {
    match verifier_context.outcome.as_ref() {
        None => Err(StepError::Assertion(String::from("missing outcome"))),
        Some(VerificationOutcome::Succeeded(report)) => Err(StepError::Assertion(format!(
            "expected failure, got success: {report:?}"
        ))),
        Some(VerificationOutcome::Failed(err)) => err
            .kind()
            .cloned()
            .ok_or_else(|| StepError::Assertion(format!("expected stage failure, got: {err}"))),
    }
}

#[given("a volume creation stage")]
fn volume_creation_stage(mut verifier_context: VerifierContext) -> VerifierContext {
    verifier_context
        .stages
        .push(build_stage(&["creating"], &["available"], &["error"]));
    verifier_context
}

#[given("a server reboot plan")]
fn server_reboot_plan(mut verifier_context: VerifierContext) -> VerifierContext {
    verifier_context
        .stages
        .push(build_stage(&["ACTIVE"], &[], &["ERROR"]));
    verifier_context.stages.push(build_stage(
        &["REBOOT", "HARD_REBOOT"],
        &["ACTIVE"],
        &["ERROR"],
    ));
    verifier_context
}

#[given("the resource reports \"{statuses}\"")]
fn resource_reports(verifier_context: VerifierContext, statuses: String) -> VerifierContext {
    for status in split_statuses(&statuses) {
        verifier_context.source.push_status(status);
    }
    verifier_context
}

#[given("the resource keeps reporting \"{status}\"")]
fn resource_keeps_reporting(verifier_context: VerifierContext, status: String) -> VerifierContext {
    let source = verifier_context.source.clone().then_repeat(status);
    VerifierContext {
        source,
        ..verifier_context
    }
}

#[given("the status fetch fails {count:usize} times before reporting \"{status}\"")]
fn fetch_fails_then_reports(
    verifier_context: VerifierContext,
    count: usize,
    status: String,
) -> VerifierContext {
    verifier_context.source.push_failures(count);
    verifier_context.source.push_status(status);
    verifier_context
}

#[when("I verify the status progression")]
fn verify_progression(mut verifier_context: VerifierContext) -> VerifierContext {
    let verifier = StatusProgressionVerifier::new(
        "resource",
        "res-1",
        verifier_context.source.clone(),
    )
    .with_stages(verifier_context.stages.clone());
    verifier_context.outcome = Some(verifier.start_blocking().into());
    verifier_context
}

#[then("verification succeeds with final status \"{status}\"")]
fn succeeds_with_status(
    verifier_context: &VerifierContext,
    status: String,
) -> Result<(), StepError> {
    let report = match verifier_context.outcome.as_ref() {
        Some(VerificationOutcome::Succeeded(report)) => report,
        Some(VerificationOutcome::Failed(err)) => {
            return Err(StepError::Assertion(format!("expected success, got: {err}")));
        }
        None => return Err(StepError::Assertion(String::from("missing outcome"))),
    };
    match report.final_status() {
        Some(final_status) if final_status.as_str() == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected final status {status}, got {other:?}"
        ))),
    }
}

#[then("the resource was polled {count:usize} times")]
fn polled_times(verifier_context: &VerifierContext, count: usize) -> Result<(), StepError> {
    let calls = verifier_context.source.calls();
    if calls == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} polls, got {calls}"
        )))
    }
}

#[then("{count:usize} stages resolved")]
fn stages_resolved(verifier_context: &VerifierContext, count: usize) -> Result<(), StepError> {
    match verifier_context.outcome.as_ref() {
        Some(VerificationOutcome::Succeeded(report)) if report.stages.len() == count => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected {count} resolved stages, got {other:?}"
        ))),
    }
}

#[then("verification fails because the resource entered \"{status}\"")]
fn fails_with_error_state(
    verifier_context: &VerifierContext,
    status: String,
) -> Result<(), StepError> {
    match failure_kind(verifier_context)? {
        FailureKind::ErrorStateReached { status: reported } if reported.as_str() == status => {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected error status {status}, got {other}"
        ))),
    }
}

#[then("verification fails with a timeout")]
fn fails_with_timeout(verifier_context: &VerifierContext) -> Result<(), StepError> {
    match failure_kind(verifier_context)? {
        FailureKind::Timeout { .. } => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected timeout, got {other}"
        ))),
    }
}

#[then("verification fails because polling failed repeatedly")]
fn fails_with_poll_failures(verifier_context: &VerifierContext) -> Result<(), StepError> {
    match failure_kind(verifier_context)? {
        FailureKind::PollFailureExceeded { attempts: 4, .. } => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected four consecutive poll failures, got {other}"
        ))),
    }
}

#[then("verification fails because \"{status}\" was unexpected")]
fn fails_with_unexpected_status(
    verifier_context: &VerifierContext,
    status: String,
) -> Result<(), StepError> {
    match failure_kind(verifier_context)? {
        FailureKind::UnexpectedStatus { status: reported } if reported.as_str() == status => {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected unexpected status {status}, got {other}"
        ))),
    }
}
