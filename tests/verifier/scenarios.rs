//! BDD scenarios for status-progression verification.

use rstest_bdd_macros::scenario;

use super::test_helpers::{VerifierContext, verifier_context};

#[scenario(
    path = "tests/features/verifier.feature",
    name = "Volume becomes available after polling"
)]
fn scenario_volume_available(verifier_context: VerifierContext) {
    let _ = verifier_context;
}

#[scenario(
    path = "tests/features/verifier.feature",
    name = "Volume enters an error status"
)]
fn scenario_volume_error(verifier_context: VerifierContext) {
    let _ = verifier_context;
}

#[scenario(
    path = "tests/features/verifier.feature",
    name = "Volume never leaves its expected status"
)]
fn scenario_volume_timeout(verifier_context: VerifierContext) {
    let _ = verifier_context;
}

#[scenario(
    path = "tests/features/verifier.feature",
    name = "Status fetches fail more often than tolerated"
)]
fn scenario_poll_failures_exceeded(verifier_context: VerifierContext) {
    let _ = verifier_context;
}

#[scenario(
    path = "tests/features/verifier.feature",
    name = "Status fetches recover within the retry budget"
)]
fn scenario_poll_failures_tolerated(verifier_context: VerifierContext) {
    let _ = verifier_context;
}

#[scenario(
    path = "tests/features/verifier.feature",
    name = "Server reboot passes through two stages"
)]
fn scenario_server_reboot(verifier_context: VerifierContext) {
    let _ = verifier_context;
}

#[scenario(
    path = "tests/features/verifier.feature",
    name = "Server reports a status no stage anticipates"
)]
fn scenario_unexpected_status(verifier_context: VerifierContext) {
    let _ = verifier_context;
}
