//! Shared fixtures and helpers for verifier BDD scenarios.

use std::time::Duration;

use rstest::fixture;
use stagewatch::test_support::ScriptedStatusSource;
use stagewatch::{ProgressionReport, Stage, StatusProgressionError};

/// Poll cadence short enough to keep scenarios fast in real time.
const POLL_RATE: Duration = Duration::from_millis(2);
/// Stage budget long enough for scripted statuses, short enough for timeouts.
const STAGE_TIMEOUT: Duration = Duration::from_millis(200);

/// Result of a verification run, held by value in the scenario context.
#[derive(Clone, Debug)]
pub enum VerificationOutcome {
    Succeeded(ProgressionReport),
    Failed(StatusProgressionError),
}

impl From<Result<ProgressionReport, StatusProgressionError>> for VerificationOutcome {
    fn from(result: Result<ProgressionReport, StatusProgressionError>) -> Self {
        match result {
            Ok(report) => Self::Succeeded(report),
            Err(err) => Self::Failed(err),
        }
    }
}

#[derive(Clone, Debug)]
pub struct VerifierContext {
    pub source: ScriptedStatusSource,
    pub stages: Vec<Stage>,
    pub outcome: Option<VerificationOutcome>,
}

#[fixture]
pub fn verifier_context() -> VerifierContext {
    VerifierContext {
        source: ScriptedStatusSource::new(),
        stages: Vec::new(),
        outcome: None,
    }
}

pub fn build_stage(expected: &[&str], acceptable: &[&str], error: &[&str]) -> Stage {
    Stage::builder()
        .expected(expected.iter().copied())
        .acceptable(acceptable.iter().copied())
        .error(error.iter().copied())
        .timeout(STAGE_TIMEOUT)
        .poll_rate(POLL_RATE)
        .poll_failure_retry_limit(3)
        .build()
        .unwrap_or_else(|err| panic!("stage should be valid: {err}"))
}

pub fn split_statuses(statuses: &str) -> Vec<String> {
    statuses
        .split(',')
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .map(String::from)
        .collect()
}

#[test]
fn outcome_keeps_the_failure_from_a_stalled_resource() {
    let source = ScriptedStatusSource::from_statuses(["creating"]).then_repeat("creating");
    let stage = build_stage(&["creating"], &["available"], &["error"]);
    let verifier =
        stagewatch::StatusProgressionVerifier::new("volume", "vol-1", source).with_stages([stage]);

    let outcome = VerificationOutcome::from(verifier.start_blocking());

    assert!(
        matches!(
            &outcome,
            VerificationOutcome::Failed(err)
                if matches!(err.kind(), Some(stagewatch::FailureKind::Timeout { .. }))
        ),
        "unexpected outcome: {outcome:?}"
    );
}
