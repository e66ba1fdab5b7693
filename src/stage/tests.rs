//! Unit tests for stage construction and plan parsing.

use std::io::Write;
use std::time::Duration;

use rstest::rstest;
use tempfile::{NamedTempFile, TempDir};

use super::*;
use crate::test_support::default_polling_config;

#[rstest]
fn builder_rejects_missing_expected_statuses() {
    let err = Stage::builder()
        .acceptable(["available"])
        .timeout(Duration::from_secs(60))
        .build()
        .expect_err("expected statuses are required");
    assert_eq!(err, StageError::NoExpectedStatuses);
}

#[rstest]
fn builder_rejects_zero_timeout() {
    let err = Stage::builder()
        .expected(["creating"])
        .build()
        .expect_err("timeout is required");
    assert_eq!(err, StageError::ZeroTimeout);
}

#[rstest]
fn builder_defaults_optional_fields() {
    let stage = Stage::builder()
        .expected(["BUILD"])
        .timeout(Duration::from_secs(30))
        .build()
        .expect("valid stage");
    assert!(stage.acceptable_statuses().is_empty());
    assert!(stage.error_statuses().is_empty());
    assert_eq!(stage.poll_rate(), Duration::ZERO);
    assert_eq!(stage.poll_failure_retry_limit(), 0);
}

#[rstest]
fn entry_statuses_combine_expected_and_acceptable() {
    let stage = Stage::builder()
        .expected(["REBOOT", "HARD_REBOOT"])
        .acceptable(["ACTIVE"])
        .error(["ERROR"])
        .timeout(Duration::from_secs(30))
        .build()
        .expect("valid stage");
    let entry = stage.entry_statuses();
    assert_eq!(entry.len(), 3);
    assert!(entry.contains("ACTIVE"));
    assert!(!entry.contains("ERROR"));
}

#[rstest]
fn plan_fills_defaults_from_config() {
    let config = default_polling_config();
    let stages = parse_plan(
        r#"[{"expected": ["creating"], "acceptable": ["available"], "timeout_secs": 90}]"#,
        &config,
    )
    .expect("plan should parse");

    let [stage] = stages.as_slice() else {
        panic!("expected a single stage, got {stages:?}");
    };
    assert_eq!(stage.timeout(), Duration::from_secs(90));
    assert_eq!(stage.poll_rate(), config.poll_rate());
    assert_eq!(
        stage.poll_failure_retry_limit(),
        config.poll_failure_retry_limit
    );
}

#[rstest]
fn plan_values_override_config() {
    let stages = parse_plan(
        r#"[{"expected": ["BUILD"], "timeout_secs": 10, "poll_rate_secs": 1,
             "poll_failure_retry_limit": 7}]"#,
        &default_polling_config(),
    )
    .expect("plan should parse");

    let [stage] = stages.as_slice() else {
        panic!("expected a single stage, got {stages:?}");
    };
    assert_eq!(stage.poll_rate(), Duration::from_secs(1));
    assert_eq!(stage.poll_failure_retry_limit(), 7);
}

#[rstest]
#[case("[]", PlanError::NoStages)]
#[case(
    r#"[{"expected": ["a"], "timeout_secs": 5}, {"expected": [], "timeout_secs": 5}]"#,
    PlanError::InvalidStage { index: 1, source: StageError::NoExpectedStatuses }
)]
#[case(
    r#"[{"expected": ["a"], "timeout_secs": 0}]"#,
    PlanError::InvalidStage { index: 0, source: StageError::ZeroTimeout }
)]
fn plan_rejects_invalid_documents(#[case] payload: &str, #[case] expected: PlanError) {
    let err = parse_plan(payload, &default_polling_config()).expect_err("plan should fail");
    assert_eq!(err, expected);
}

#[rstest]
fn plan_rejects_unknown_fields() {
    let err = parse_plan(
        r#"[{"expected": ["a"], "timeout_secs": 5, "timeout": 5}]"#,
        &default_polling_config(),
    )
    .expect_err("unknown field should fail");
    assert!(
        matches!(err, PlanError::Parse { ref message } if message.contains("unknown field")),
        "unexpected error: {err}"
    );
}

#[rstest]
fn load_plan_file_reads_absolute_path() {
    let mut file = NamedTempFile::new().unwrap_or_else(|err| panic!("temp file: {err}"));
    file.write_all(br#"[{"expected": ["creating"], "timeout_secs": 30}]"#)
        .unwrap_or_else(|err| panic!("write plan: {err}"));
    let path = file
        .path()
        .to_str()
        .unwrap_or_else(|| panic!("temp path should be UTF-8"))
        .to_owned();

    let stages = load_plan_file(&path, &default_polling_config()).expect("plan file loads");
    assert_eq!(stages.len(), 1);
}

#[rstest]
fn load_plan_file_follows_parent_directory_components() {
    let cwd = std::env::current_dir().unwrap_or_else(|err| panic!("current dir: {err}"));
    let cwd_name = cwd
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_else(|| panic!("current dir should have a UTF-8 name"));
    let tmp = TempDir::new_in(".").unwrap_or_else(|err| panic!("tempdir: {err}"));
    let tmp_name = tmp
        .path()
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_else(|| panic!("temp dir should have a UTF-8 name"));
    std::fs::create_dir(tmp.path().join("plans"))
        .unwrap_or_else(|err| panic!("create plans dir: {err}"));
    std::fs::write(
        tmp.path().join("reboot.json"),
        r#"[{"expected": ["REBOOT"], "acceptable": ["ACTIVE"], "timeout_secs": 30}]"#,
    )
    .unwrap_or_else(|err| panic!("write plan: {err}"));

    let path = format!("../{cwd_name}/{tmp_name}/plans/../reboot.json");
    let stages = load_plan_file(&path, &default_polling_config())
        .unwrap_or_else(|err| panic!("plan at {path} should load: {err}"));

    assert_eq!(stages.len(), 1);
}

#[rstest]
#[case("")]
#[case("   ")]
fn load_plan_file_rejects_blank_path(#[case] path: &str) {
    let err = load_plan_file(path, &default_polling_config()).expect_err("blank path");
    assert_eq!(err, PlanError::EmptyPath);
}

#[rstest]
fn load_plan_file_reports_missing_file() {
    let err = load_plan_file("/nonexistent/stagewatch-plan.json", &default_polling_config())
        .expect_err("missing file");
    assert!(
        matches!(err, PlanError::FileRead { ref path, .. } if path.ends_with("stagewatch-plan.json")),
        "unexpected error: {err}"
    );
}
