//! JSON stage plans used by the `stagewatch` binary.
//!
//! A plan is a JSON array of stage objects:
//!
//! ```json
//! [
//!   { "expected": ["creating"], "acceptable": ["available"],
//!     "error": ["error"], "timeout_secs": 120 }
//! ]
//! ```
//!
//! `poll_rate_secs` and `poll_failure_retry_limit` fall back to the
//! [`PollingConfig`] values when omitted.

use std::time::Duration;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::Deserialize;
use thiserror::Error;

use crate::config::PollingConfig;
use crate::status::StatusSet;

use super::{Stage, StageError};

/// Serialised description of one stage.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StagePlan {
    /// Statuses that keep the stage polling.
    pub expected: StatusSet,
    /// Statuses that resolve the stage early.
    #[serde(default)]
    pub acceptable: StatusSet,
    /// Statuses that fail the verification.
    #[serde(default)]
    pub error: StatusSet,
    /// Stage timeout in seconds.
    pub timeout_secs: u64,
    /// Seconds between polls; defaults to the configured poll rate.
    #[serde(default)]
    pub poll_rate_secs: Option<u64>,
    /// Tolerated consecutive fetch failures; defaults to the configured limit.
    #[serde(default)]
    pub poll_failure_retry_limit: Option<u32>,
}

impl StagePlan {
    /// Converts the plan into a validated [`Stage`], filling omitted values
    /// from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError`] when the resulting stage is invalid.
    pub fn into_stage(self, config: &PollingConfig) -> Result<Stage, StageError> {
        let poll_rate = self
            .poll_rate_secs
            .map_or_else(|| config.poll_rate(), Duration::from_secs);
        let retry_limit = self
            .poll_failure_retry_limit
            .unwrap_or(config.poll_failure_retry_limit);

        Stage::builder()
            .expected(self.expected.iter().cloned())
            .acceptable(self.acceptable.iter().cloned())
            .error(self.error.iter().cloned())
            .timeout(Duration::from_secs(self.timeout_secs))
            .poll_rate(poll_rate)
            .poll_failure_retry_limit(retry_limit)
            .build()
    }
}

/// Errors raised while reading or converting a stage plan.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PlanError {
    /// Raised when the plan file path is blank.
    #[error("plan file path must not be empty")]
    EmptyPath,
    /// Raised when the plan file cannot be read.
    #[error("failed to read plan file {path}: {message}")]
    FileRead {
        /// Path that was read.
        path: String,
        /// Error message from the file system.
        message: String,
    },
    /// Raised when the plan is not valid JSON or has unknown fields.
    #[error("failed to parse stage plan: {message}")]
    Parse {
        /// Parser error message.
        message: String,
    },
    /// Raised when the plan lists no stages.
    #[error("stage plan must contain at least one stage")]
    NoStages,
    /// Raised when a stage in the plan fails validation.
    #[error("stage {index} is invalid: {source}")]
    InvalidStage {
        /// Zero-based position of the stage in the plan.
        index: usize,
        /// Validation failure.
        source: StageError,
    },
}

/// Parses a JSON plan into validated stages.
///
/// # Errors
///
/// Returns [`PlanError`] when the payload is malformed, empty, or contains an
/// invalid stage.
pub fn parse_plan(payload: &str, config: &PollingConfig) -> Result<Vec<Stage>, PlanError> {
    let plans: Vec<StagePlan> =
        serde_json::from_str(payload).map_err(|err| PlanError::Parse {
            message: err.to_string(),
        })?;
    if plans.is_empty() {
        return Err(PlanError::NoStages);
    }

    plans
        .into_iter()
        .enumerate()
        .map(|(index, plan)| {
            plan.into_stage(config)
                .map_err(|source| PlanError::InvalidStage { index, source })
        })
        .collect()
}

/// Reads and parses a JSON plan file.
///
/// # Errors
///
/// Returns [`PlanError::FileRead`] when the file cannot be read, or any error
/// from [`parse_plan`].
pub fn load_plan_file(path: &str, config: &PollingConfig) -> Result<Vec<Stage>, PlanError> {
    if path.trim().is_empty() {
        return Err(PlanError::EmptyPath);
    }
    let payload = read_to_string_ambient(path).map_err(|message| PlanError::FileRead {
        path: path.to_owned(),
        message,
    })?;
    parse_plan(&payload, config)
}

/// Opens the plan's parent directory with ambient authority and reads the
/// file by name, so relative paths containing `..` resolve like any other.
fn read_to_string_ambient(path: &str) -> Result<String, String> {
    let plan_path = Utf8Path::new(path);
    let file_name = plan_path
        .file_name()
        .ok_or_else(|| format!("path has no file name: {plan_path}"))?;
    let dir_path = match plan_path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_name).map_err(|err| err.to_string())
}
