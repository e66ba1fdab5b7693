//! Integration tests for polling configuration and plan loading.

use std::time::Duration;

use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use rstest::{fixture, rstest};
use stagewatch::stage::load_plan_file;
use stagewatch::test_support::default_polling_config;
use stagewatch::{ConfigError, PlanError, PollingConfig, config};
use tempfile::TempDir;

#[fixture]
fn valid_config() -> PollingConfig {
    default_polling_config()
}

fn assert_actionable(
    config: PollingConfig,
    mutate: impl FnOnce(&mut PollingConfig),
    env_var: &str,
    toml_key: &str,
) {
    let mut cfg = config;
    mutate(&mut cfg);

    let err = cfg.validate().expect_err("invalid value should be rejected");
    let ConfigError::InvalidField(ref message) = err else {
        panic!("expected InvalidField error, got {err:?}");
    };
    assert!(
        message.contains(env_var),
        "error should mention env var {env_var}: {message}"
    );
    assert!(
        message.contains(toml_key) || message.contains("adjust"),
        "error should mention TOML key {toml_key}: {message}"
    );
}

#[rstest]
fn loaded_defaults_match_test_support_defaults() {
    if std::env::vars_os().any(|(key, _)| key.to_string_lossy().starts_with("STAGEWATCH_")) {
        return;
    }

    let loaded = PollingConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("defaults should load: {err}"));

    assert_eq!(loaded, default_polling_config());
}

#[rstest]
fn defaults_validate(valid_config: PollingConfig) {
    assert!(valid_config.validate().is_ok());
}

#[rstest]
fn validation_produces_actionable_errors_for_zero_timeouts(valid_config: PollingConfig) {
    assert_actionable(
        valid_config.clone(),
        |cfg| cfg.volume_attach_timeout_secs = 0,
        "STAGEWATCH_VOLUME_ATTACH_TIMEOUT_SECS",
        "volume_attach_timeout_secs",
    );
    assert_actionable(
        valid_config.clone(),
        |cfg| cfg.server_build_timeout_secs = 0,
        "STAGEWATCH_SERVER_BUILD_TIMEOUT_SECS",
        "server_build_timeout_secs",
    );
    assert_actionable(
        valid_config.clone(),
        |cfg| cfg.server_migrate_timeout_secs = 0,
        "STAGEWATCH_SERVER_MIGRATE_TIMEOUT_SECS",
        "server_migrate_timeout_secs",
    );
    assert_actionable(
        valid_config,
        |cfg| cfg.volume_create_min_timeout_secs = 0,
        "STAGEWATCH_VOLUME_CREATE_MIN_TIMEOUT_SECS",
        "volume_create_min_timeout_secs",
    );
}

#[rstest]
fn validation_rejects_minimum_above_maximum(valid_config: PollingConfig) {
    assert_actionable(
        valid_config,
        |cfg| cfg.snapshot_create_min_timeout_secs = 7200,
        "STAGEWATCH_SNAPSHOT_CREATE_MIN_TIMEOUT_SECS",
        "snapshot_create_min_timeout_secs",
    );
}

#[rstest]
#[case(0, config::DEFAULT_VOLUME_CREATE_MIN_TIMEOUT_SECS)]
#[case(100, 560)]
#[case(u64::MAX, config::DEFAULT_VOLUME_CREATE_MAX_TIMEOUT_SECS)]
fn volume_create_timeout_is_clamped(
    valid_config: PollingConfig,
    #[case] size_gb: u64,
    #[case] expected_secs: u64,
) {
    assert_eq!(
        valid_config.volume_create_timeout(size_gb),
        Duration::from_secs(expected_secs)
    );
}

#[rstest]
fn plan_file_inherits_configured_poll_rate(valid_config: PollingConfig) {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let tmp_root =
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap_or_else(|non_utf8_path| {
            panic!("temp dir should be utf8: {}", non_utf8_path.display())
        });
    Dir::open_ambient_dir(&tmp_root, ambient_authority())
        .unwrap_or_else(|err| panic!("open temp dir: {err}"))
        .write(
            "plan.json",
            r#"[{"expected": ["BUILD"], "acceptable": ["ACTIVE"], "timeout_secs": 600}]"#,
        )
        .unwrap_or_else(|err| panic!("write plan: {err}"));

    let stages = load_plan_file(tmp_root.join("plan.json").as_str(), &valid_config)
        .unwrap_or_else(|err| panic!("plan should load: {err}"));

    let [stage] = stages.as_slice() else {
        panic!("expected one stage, got {stages:?}");
    };
    assert_eq!(stage.poll_rate(), valid_config.poll_rate());
    assert_eq!(stage.timeout(), Duration::from_secs(600));
}

#[rstest]
fn plan_file_with_zero_timeout_names_the_stage(valid_config: PollingConfig) {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let path = tmp.path().join("plan.json");
    std::fs::write(
        &path,
        r#"[{"expected": ["BUILD"], "timeout_secs": 60}, {"expected": ["ACTIVE"], "timeout_secs": 0}]"#,
    )
    .unwrap_or_else(|err| panic!("write plan: {err}"));
    let path_str = path
        .to_str()
        .unwrap_or_else(|| panic!("temp path should be utf8: {}", path.display()));

    let err = load_plan_file(path_str, &valid_config).expect_err("zero timeout is invalid");

    assert!(
        matches!(err, PlanError::InvalidStage { index: 1, .. }),
        "unexpected error: {err}"
    );
}
