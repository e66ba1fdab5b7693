//! Summary of a successful verification.

use std::time::Duration;

use crate::poller::{PollSuccess, Resolution};
use crate::status::{StatusToken, StatusTrail};

/// Outcome of one resolved stage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StageReport {
    /// Zero-based index of the stage.
    pub index: usize,
    /// Status that resolved the stage.
    pub final_status: StatusToken,
    /// How the stage resolved.
    pub resolution: Resolution,
    /// Number of fetch attempts made during the stage.
    pub polls: u32,
    /// Wall-clock time spent in the stage.
    pub elapsed: Duration,
    /// Distinct statuses observed during the stage.
    pub trail: StatusTrail,
}

impl StageReport {
    pub(super) fn from_success(index: usize, success: PollSuccess) -> Self {
        Self {
            index,
            final_status: success.final_status,
            resolution: success.resolution,
            polls: success.polls,
            elapsed: success.elapsed,
            trail: success.trail,
        }
    }
}

/// Outcome of a verification in which every stage resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgressionReport {
    /// Human-readable resource kind.
    pub resource_label: String,
    /// Provider identifier of the resource.
    pub resource_id: String,
    /// One entry per stage, in execution order.
    pub stages: Vec<StageReport>,
}

impl ProgressionReport {
    /// Status that resolved the last stage.
    #[must_use]
    pub fn final_status(&self) -> Option<&StatusToken> {
        self.stages.last().map(|stage| &stage.final_status)
    }

    /// Total fetch attempts across all stages.
    #[must_use]
    pub fn total_polls(&self) -> u32 {
        self.stages
            .iter()
            .fold(0, |total, stage| total.saturating_add(stage.polls))
    }

    /// Total wall-clock time across all stages.
    #[must_use]
    pub fn total_elapsed(&self) -> Duration {
        self.stages.iter().map(|stage| stage.elapsed).sum()
    }
}
