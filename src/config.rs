//! Polling configuration loaded via `ortho-config`.
//!
//! The configuration is passed explicitly to presets and plan conversion so
//! that every verifier sees the same values without process-wide state.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default interval between status fetches.
pub const DEFAULT_POLL_RATE_SECS: u64 = 5;
/// Default number of consecutive fetch failures tolerated per stage.
pub const DEFAULT_POLL_FAILURE_RETRY_LIMIT: u32 = 3;
/// Default lower bound for the volume creation timeout.
pub const DEFAULT_VOLUME_CREATE_MIN_TIMEOUT_SECS: u64 = 60;
/// Default seconds added per gigabyte of volume size.
pub const DEFAULT_VOLUME_CREATE_PER_GB_SECS: u64 = 5;
/// Default upper bound for the volume creation timeout.
pub const DEFAULT_VOLUME_CREATE_MAX_TIMEOUT_SECS: u64 = 1800;
/// Default lower bound for the snapshot creation timeout.
pub const DEFAULT_SNAPSHOT_CREATE_MIN_TIMEOUT_SECS: u64 = 60;
/// Default seconds added per gigabyte of the source volume.
pub const DEFAULT_SNAPSHOT_CREATE_PER_GB_SECS: u64 = 10;
/// Default upper bound for the snapshot creation timeout.
pub const DEFAULT_SNAPSHOT_CREATE_MAX_TIMEOUT_SECS: u64 = 3600;
/// Default timeout for volume attach and detach.
pub const DEFAULT_VOLUME_ATTACH_TIMEOUT_SECS: u64 = 120;
/// Default timeout for a server build.
pub const DEFAULT_SERVER_BUILD_TIMEOUT_SECS: u64 = 600;
/// Default timeout for a resize or resize confirmation.
pub const DEFAULT_SERVER_RESIZE_TIMEOUT_SECS: u64 = 900;
/// Default timeout for a live migration.
pub const DEFAULT_SERVER_MIGRATE_TIMEOUT_SECS: u64 = 900;
/// Default timeout for short server actions.
pub const DEFAULT_SERVER_ACTION_TIMEOUT_SECS: u64 = 300;

/// Timeouts and cadence applied to status-progression verification. Values
/// merge defaults, configuration files, environment variables, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "STAGEWATCH",
    discovery(
        app_name = "stagewatch",
        env_var = "STAGEWATCH_CONFIG_PATH",
        config_file_name = "stagewatch.toml",
        dotfile_name = ".stagewatch.toml",
        project_file_name = "stagewatch.toml"
    )
)]
pub struct PollingConfig {
    /// Seconds between status fetches.
    #[ortho_config(default = DEFAULT_POLL_RATE_SECS)]
    pub poll_rate_secs: u64,
    /// Consecutive fetch failures tolerated before a stage aborts.
    #[ortho_config(default = DEFAULT_POLL_FAILURE_RETRY_LIMIT)]
    pub poll_failure_retry_limit: u32,
    /// Lower bound for the volume creation timeout.
    #[ortho_config(default = DEFAULT_VOLUME_CREATE_MIN_TIMEOUT_SECS)]
    pub volume_create_min_timeout_secs: u64,
    /// Additional seconds allowed per gigabyte of requested volume size.
    #[ortho_config(default = DEFAULT_VOLUME_CREATE_PER_GB_SECS)]
    pub volume_create_per_gb_secs: u64,
    /// Upper bound for the volume creation timeout.
    #[ortho_config(default = DEFAULT_VOLUME_CREATE_MAX_TIMEOUT_SECS)]
    pub volume_create_max_timeout_secs: u64,
    /// Lower bound for the snapshot creation timeout.
    #[ortho_config(default = DEFAULT_SNAPSHOT_CREATE_MIN_TIMEOUT_SECS)]
    pub snapshot_create_min_timeout_secs: u64,
    /// Additional seconds allowed per gigabyte of the source volume.
    #[ortho_config(default = DEFAULT_SNAPSHOT_CREATE_PER_GB_SECS)]
    pub snapshot_create_per_gb_secs: u64,
    /// Upper bound for the snapshot creation timeout.
    #[ortho_config(default = DEFAULT_SNAPSHOT_CREATE_MAX_TIMEOUT_SECS)]
    pub snapshot_create_max_timeout_secs: u64,
    /// Timeout for attaching or detaching a volume.
    #[ortho_config(default = DEFAULT_VOLUME_ATTACH_TIMEOUT_SECS)]
    pub volume_attach_timeout_secs: u64,
    /// Timeout for a server build to reach `ACTIVE`.
    #[ortho_config(default = DEFAULT_SERVER_BUILD_TIMEOUT_SECS)]
    pub server_build_timeout_secs: u64,
    /// Timeout for a resize or resize confirmation.
    #[ortho_config(default = DEFAULT_SERVER_RESIZE_TIMEOUT_SECS)]
    pub server_resize_timeout_secs: u64,
    /// Timeout for a live migration.
    #[ortho_config(default = DEFAULT_SERVER_MIGRATE_TIMEOUT_SECS)]
    pub server_migrate_timeout_secs: u64,
    /// Timeout for short server actions such as reboot, rescue, and suspend.
    #[ortho_config(default = DEFAULT_SERVER_ACTION_TIMEOUT_SECS)]
    pub server_action_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl PollingConfig {
    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidField(format!(
                "{} must be greater than zero: set {} or {} in stagewatch.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    fn require_ordered(
        min: u64,
        max: u64,
        min_meta: &FieldMetadata,
        max_meta: &FieldMetadata,
    ) -> Result<(), ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidField(format!(
                "{} ({min}s) exceeds {} ({max}s): adjust {} or {}",
                min_meta.description, max_meta.description, min_meta.env_var, max_meta.env_var
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("stagewatch")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Interval between status fetches.
    #[must_use]
    pub const fn poll_rate(&self) -> Duration {
        Duration::from_secs(self.poll_rate_secs)
    }

    /// Volume creation timeout scaled by the requested size and clamped to
    /// the configured bounds.
    #[must_use]
    pub fn volume_create_timeout(&self, size_gb: u64) -> Duration {
        scaled_timeout(
            self.volume_create_min_timeout_secs,
            self.volume_create_per_gb_secs,
            self.volume_create_max_timeout_secs,
            size_gb,
        )
    }

    /// Snapshot creation timeout scaled by the source volume size and clamped
    /// to the configured bounds.
    #[must_use]
    pub fn snapshot_create_timeout(&self, size_gb: u64) -> Duration {
        scaled_timeout(
            self.snapshot_create_min_timeout_secs,
            self.snapshot_create_per_gb_secs,
            self.snapshot_create_max_timeout_secs,
            size_gb,
        )
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and TOML key that control the offending value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a timeout is zero or a
    /// minimum exceeds its maximum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let volume_min = FieldMetadata::new(
            "minimum volume create timeout",
            "STAGEWATCH_VOLUME_CREATE_MIN_TIMEOUT_SECS",
            "volume_create_min_timeout_secs",
        );
        let volume_max = FieldMetadata::new(
            "maximum volume create timeout",
            "STAGEWATCH_VOLUME_CREATE_MAX_TIMEOUT_SECS",
            "volume_create_max_timeout_secs",
        );
        let snapshot_min = FieldMetadata::new(
            "minimum snapshot create timeout",
            "STAGEWATCH_SNAPSHOT_CREATE_MIN_TIMEOUT_SECS",
            "snapshot_create_min_timeout_secs",
        );
        let snapshot_max = FieldMetadata::new(
            "maximum snapshot create timeout",
            "STAGEWATCH_SNAPSHOT_CREATE_MAX_TIMEOUT_SECS",
            "snapshot_create_max_timeout_secs",
        );

        Self::require_positive(self.volume_create_min_timeout_secs, &volume_min)?;
        Self::require_positive(self.volume_create_max_timeout_secs, &volume_max)?;
        Self::require_ordered(
            self.volume_create_min_timeout_secs,
            self.volume_create_max_timeout_secs,
            &volume_min,
            &volume_max,
        )?;
        Self::require_positive(self.snapshot_create_min_timeout_secs, &snapshot_min)?;
        Self::require_positive(self.snapshot_create_max_timeout_secs, &snapshot_max)?;
        Self::require_ordered(
            self.snapshot_create_min_timeout_secs,
            self.snapshot_create_max_timeout_secs,
            &snapshot_min,
            &snapshot_max,
        )?;
        Self::require_positive(
            self.volume_attach_timeout_secs,
            &FieldMetadata::new(
                "volume attach timeout",
                "STAGEWATCH_VOLUME_ATTACH_TIMEOUT_SECS",
                "volume_attach_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.server_build_timeout_secs,
            &FieldMetadata::new(
                "server build timeout",
                "STAGEWATCH_SERVER_BUILD_TIMEOUT_SECS",
                "server_build_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.server_resize_timeout_secs,
            &FieldMetadata::new(
                "server resize timeout",
                "STAGEWATCH_SERVER_RESIZE_TIMEOUT_SECS",
                "server_resize_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.server_migrate_timeout_secs,
            &FieldMetadata::new(
                "server migrate timeout",
                "STAGEWATCH_SERVER_MIGRATE_TIMEOUT_SECS",
                "server_migrate_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.server_action_timeout_secs,
            &FieldMetadata::new(
                "server action timeout",
                "STAGEWATCH_SERVER_ACTION_TIMEOUT_SECS",
                "server_action_timeout_secs",
            ),
        )?;
        Ok(())
    }
}

fn scaled_timeout(min_secs: u64, per_gb_secs: u64, max_secs: u64, size_gb: u64) -> Duration {
    let scaled = min_secs.saturating_add(per_gb_secs.saturating_mul(size_gb));
    Duration::from_secs(scaled.min(max_secs))
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
