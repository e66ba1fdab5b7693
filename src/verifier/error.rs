//! Error type for status-progression verification.

use std::time::Duration;

use thiserror::Error;

use crate::poller::FailureKind;
use crate::status::StatusTrail;

/// Errors raised while verifying a resource's status progression.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StatusProgressionError {
    /// Raised when `start` is called on a verifier without stages.
    #[error("no stages registered for {resource_label} {resource_id}")]
    NoStages {
        /// Human-readable resource kind (for example `volume`).
        resource_label: String,
        /// Provider identifier of the resource.
        resource_id: String,
    },
    /// Raised when a stage fails.
    #[error(
        "{resource_label} {resource_id} failed stage {stage_index}: {kind} \
         (observed {trail}, elapsed {elapsed:?})"
    )]
    Stage {
        /// Human-readable resource kind (for example `volume`).
        resource_label: String,
        /// Provider identifier of the resource.
        resource_id: String,
        /// Zero-based index of the failing stage.
        stage_index: usize,
        /// Distinct statuses observed during the failing stage.
        trail: StatusTrail,
        /// Wall-clock time spent in the failing stage.
        elapsed: Duration,
        /// Failure classification.
        kind: Box<FailureKind>,
    },
    /// Raised when the blocking runtime cannot be started.
    #[error("failed to start polling runtime: {message}")]
    Runtime {
        /// Error message from the runtime builder.
        message: String,
    },
}

impl StatusProgressionError {
    /// Returns the failure classification when a stage failed.
    #[must_use]
    pub fn kind(&self) -> Option<&FailureKind> {
        match self {
            Self::Stage { kind, .. } => Some(kind.as_ref()),
            Self::NoStages { .. } | Self::Runtime { .. } => None,
        }
    }

    /// Returns the index of the failing stage.
    #[must_use]
    pub const fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Stage { stage_index, .. } => Some(*stage_index),
            Self::NoStages { .. } | Self::Runtime { .. } => None,
        }
    }

    /// Returns `true` when the resource entered a declared error status.
    ///
    /// Negative-path tests deliberately drive a resource into an error status
    /// and use this to tell that outcome apart from timeouts and fetch
    /// failures.
    #[must_use]
    pub fn is_error_state(&self) -> bool {
        matches!(self.kind(), Some(FailureKind::ErrorStateReached { .. }))
    }
}
