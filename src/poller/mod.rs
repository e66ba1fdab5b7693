//! Polling loop for a single stage.
//!
//! [`StatusPoller`] fetches a resource's status at the stage's poll rate until
//! the status leaves the stage's expected set, the stage's timeout elapses, or
//! the fetch-failure budget is exhausted.
//!
//! Each successful fetch is classified in this order:
//!
//! 1. a member of the error set fails the stage, even when it is also
//!    expected;
//! 2. a member of the acceptable set (and not the expected set) resolves the
//!    stage early;
//! 3. a member of the expected set keeps polling;
//! 4. a member of the handoff set (the next stage's entry statuses) resolves
//!    the stage;
//! 5. anything else fails the stage as an unexpected status.
//!
//! The timeout is checked after each tick, so a resolving status seen at the
//! deadline still wins and the stage may overrun by up to one poll interval.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::source::StatusSource;
use crate::stage::Stage;
use crate::status::{StatusSet, StatusToken, StatusTrail};

/// How a stage resolved successfully.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The resource reported an acceptable status and skipped ahead.
    Acceptable,
    /// The resource moved into the next stage's statuses.
    Handoff,
}

/// Why a stage failed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FailureKind {
    /// The status fetch failed more times in a row than the stage allows.
    #[error("status fetch failed {attempts} consecutive times; last error: {last_error}")]
    PollFailureExceeded {
        /// Consecutive failed fetches, including the last one.
        attempts: u32,
        /// Message of the last fetch error.
        last_error: String,
    },
    /// The resource entered a status in the stage's error set.
    #[error("entered error status {status}")]
    ErrorStateReached {
        /// Offending status.
        status: StatusToken,
    },
    /// The stage did not resolve within its timeout.
    #[error("timed out after {timeout:?} (last status: {})", display_last(.last_status.as_ref()))]
    Timeout {
        /// Last successfully fetched status, if any.
        last_status: Option<StatusToken>,
        /// Configured stage timeout.
        timeout: Duration,
    },
    /// The resource reported a status the stage does not anticipate.
    #[error("reported unexpected status {status}")]
    UnexpectedStatus {
        /// Offending status.
        status: StatusToken,
    },
}

fn display_last(status: Option<&StatusToken>) -> &str {
    status.map_or("none", StatusToken::as_str)
}

/// Successful stage resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PollSuccess {
    /// Status that resolved the stage.
    pub final_status: StatusToken,
    /// How the stage resolved.
    pub resolution: Resolution,
    /// Number of fetch attempts, including failed ones.
    pub polls: u32,
    /// Wall-clock time spent in the stage.
    pub elapsed: Duration,
    /// Distinct statuses observed, in order.
    pub trail: StatusTrail,
}

/// Stage failure with the polling history that led to it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{kind} after {polls} polls (observed {trail})")]
pub struct PollFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Number of fetch attempts, including failed ones.
    pub polls: u32,
    /// Wall-clock time spent in the stage.
    pub elapsed: Duration,
    /// Distinct statuses observed, in order.
    pub trail: StatusTrail,
}

enum Verdict {
    Continue,
    Resolved(Resolution),
    Failed(FailureKind),
}

#[derive(Default)]
struct PollState {
    polls: u32,
    consecutive_failures: u32,
    trail: StatusTrail,
}

impl PollState {
    fn fail(self, kind: FailureKind, started: Instant) -> PollFailure {
        PollFailure {
            kind,
            polls: self.polls,
            elapsed: started.elapsed(),
            trail: self.trail,
        }
    }
}

/// Polls one stage of a resource's lifecycle.
#[derive(Clone, Debug)]
pub struct StatusPoller<'a> {
    stage: &'a Stage,
    handoff: StatusSet,
}

impl<'a> StatusPoller<'a> {
    /// Creates a poller for `stage` with an empty handoff set.
    #[must_use]
    pub const fn new(stage: &'a Stage) -> Self {
        Self {
            stage,
            handoff: StatusSet::new(),
        }
    }

    /// Sets the statuses that mean the resource has entered the next stage.
    #[must_use]
    pub fn with_handoff(mut self, handoff: StatusSet) -> Self {
        self.handoff = handoff;
        self
    }

    /// Polls `source` for `resource_id` until the stage resolves or fails.
    ///
    /// # Errors
    ///
    /// Returns [`PollFailure`] tagged with the [`FailureKind`] that ended the
    /// stage.
    pub async fn poll<S>(&self, source: &S, resource_id: &str) -> Result<PollSuccess, PollFailure>
    where
        S: StatusSource + ?Sized,
    {
        let started = Instant::now();
        let limit = self.stage.poll_failure_retry_limit();
        let mut state = PollState::default();

        loop {
            state.polls = state.polls.saturating_add(1);
            match source.fetch_status(resource_id).await {
                Err(err) => {
                    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                    warn!(
                        resource_id,
                        attempt = state.consecutive_failures,
                        limit,
                        error = %err,
                        "status fetch failed"
                    );
                    if state.consecutive_failures > limit {
                        let attempts = state.consecutive_failures;
                        return Err(state.fail(
                            FailureKind::PollFailureExceeded {
                                attempts,
                                last_error: err.to_string(),
                            },
                            started,
                        ));
                    }
                }
                Ok(status) => {
                    state.consecutive_failures = 0;
                    state.trail.record(&status);
                    debug!(resource_id, polls = state.polls, %status, "polled status");
                    match self.classify(&status) {
                        Verdict::Continue => {}
                        Verdict::Resolved(resolution) => {
                            return Ok(PollSuccess {
                                final_status: status,
                                resolution,
                                polls: state.polls,
                                elapsed: started.elapsed(),
                                trail: state.trail,
                            });
                        }
                        Verdict::Failed(kind) => return Err(state.fail(kind, started)),
                    }
                }
            }

            if started.elapsed() >= self.stage.timeout() {
                let last_status = state.trail.last().cloned();
                return Err(state.fail(
                    FailureKind::Timeout {
                        last_status,
                        timeout: self.stage.timeout(),
                    },
                    started,
                ));
            }
            sleep(self.stage.poll_rate()).await;
        }
    }

    fn classify(&self, status: &StatusToken) -> Verdict {
        let raw = status.as_str();
        if self.stage.error_statuses().contains(raw) {
            return Verdict::Failed(FailureKind::ErrorStateReached {
                status: status.clone(),
            });
        }
        let expected = self.stage.expected_statuses().contains(raw);
        if self.stage.acceptable_statuses().contains(raw) && !expected {
            return Verdict::Resolved(Resolution::Acceptable);
        }
        if expected {
            return Verdict::Continue;
        }
        if self.handoff.contains(raw) {
            return Verdict::Resolved(Resolution::Handoff);
        }
        Verdict::Failed(FailureKind::UnexpectedStatus {
            status: status.clone(),
        })
    }
}
