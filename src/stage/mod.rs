//! Ordered stages of an expected resource lifecycle.
//!
//! A [`Stage`] describes one step: the statuses that mean "still in progress",
//! the statuses that mean "already done", the statuses that are fatal, and the
//! time budget and cadence for polling.

use std::time::Duration;

use thiserror::Error;

use crate::status::{StatusSet, StatusToken};

mod plan;

pub use plan::{PlanError, StagePlan, load_plan_file, parse_plan};

/// One step in an expected resource lifecycle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stage {
    expected_statuses: StatusSet,
    acceptable_statuses: StatusSet,
    error_statuses: StatusSet,
    timeout: Duration,
    poll_rate: Duration,
    poll_failure_retry_limit: u32,
}

impl Stage {
    /// Starts a builder for a [`Stage`].
    #[must_use]
    pub fn builder() -> StageBuilder {
        StageBuilder::new()
    }

    /// Statuses meaning the resource is still progressing through this stage.
    #[must_use]
    pub const fn expected_statuses(&self) -> &StatusSet {
        &self.expected_statuses
    }

    /// Statuses meaning the resource already moved past this stage.
    #[must_use]
    pub const fn acceptable_statuses(&self) -> &StatusSet {
        &self.acceptable_statuses
    }

    /// Statuses that fail the whole verification.
    #[must_use]
    pub const fn error_statuses(&self) -> &StatusSet {
        &self.error_statuses
    }

    /// Wall-clock budget for this stage, measured from its first poll.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between status fetches.
    #[must_use]
    pub const fn poll_rate(&self) -> Duration {
        self.poll_rate
    }

    /// Consecutive fetch failures tolerated before the stage aborts.
    #[must_use]
    pub const fn poll_failure_retry_limit(&self) -> u32 {
        self.poll_failure_retry_limit
    }

    /// Statuses that show a resource has entered this stage: the expected and
    /// acceptable sets combined. The preceding stage hands off on these.
    #[must_use]
    pub fn entry_statuses(&self) -> StatusSet {
        self.expected_statuses.union(&self.acceptable_statuses)
    }
}

/// Builder for [`Stage`] that validates on construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StageBuilder {
    expected_statuses: StatusSet,
    acceptable_statuses: StatusSet,
    error_statuses: StatusSet,
    timeout: Duration,
    poll_rate: Duration,
    poll_failure_retry_limit: u32,
}

impl StageBuilder {
    /// Creates an empty builder; expected statuses and a timeout must be set
    /// before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the statuses that keep the stage polling.
    #[must_use]
    pub fn expected<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StatusToken>,
    {
        self.expected_statuses = statuses.into_iter().collect();
        self
    }

    /// Sets the statuses that resolve the stage early.
    #[must_use]
    pub fn acceptable<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StatusToken>,
    {
        self.acceptable_statuses = statuses.into_iter().collect();
        self
    }

    /// Sets the statuses that fail the verification.
    #[must_use]
    pub fn error<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StatusToken>,
    {
        self.error_statuses = statuses.into_iter().collect();
        self
    }

    /// Sets the stage timeout.
    #[must_use]
    pub const fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }

    /// Sets the delay between polls.
    #[must_use]
    pub const fn poll_rate(mut self, value: Duration) -> Self {
        self.poll_rate = value;
        self
    }

    /// Sets how many consecutive fetch failures are tolerated.
    #[must_use]
    pub const fn poll_failure_retry_limit(mut self, value: u32) -> Self {
        self.poll_failure_retry_limit = value;
        self
    }

    /// Builds and validates the [`Stage`].
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NoExpectedStatuses`] when the expected set is
    /// empty, or [`StageError::ZeroTimeout`] when no timeout was given.
    pub fn build(self) -> Result<Stage, StageError> {
        if self.expected_statuses.is_empty() {
            return Err(StageError::NoExpectedStatuses);
        }
        if self.timeout.is_zero() {
            return Err(StageError::ZeroTimeout);
        }
        Ok(Stage {
            expected_statuses: self.expected_statuses,
            acceptable_statuses: self.acceptable_statuses,
            error_statuses: self.error_statuses,
            timeout: self.timeout,
            poll_rate: self.poll_rate,
            poll_failure_retry_limit: self.poll_failure_retry_limit,
        })
    }
}

/// Errors raised while building a [`Stage`].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum StageError {
    /// Raised when a stage declares no expected statuses.
    #[error("stage must declare at least one expected status")]
    NoExpectedStatuses,
    /// Raised when a stage has a zero timeout.
    #[error("stage timeout must be greater than zero")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests;
