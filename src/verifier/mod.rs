//! Ordered multi-stage status verification for a single resource.
//!
//! A [`StatusProgressionVerifier`] is built once per assertion: stages are
//! appended with [`StatusProgressionVerifier::add_state`] and
//! [`StatusProgressionVerifier::start`] consumes the verifier, polling each
//! stage in insertion order. A stage is never polled before its predecessor
//! resolved.
//!
//! Stage *i* resolves successfully when the resource reports one of its
//! acceptable statuses or one of stage *i + 1*'s expected or acceptable
//! statuses. A status outside every known set fails the verification as
//! [`crate::poller::FailureKind::UnexpectedStatus`].

use tokio::runtime::Builder;
use tracing::{error, info};

use crate::poller::StatusPoller;
use crate::source::StatusSource;
use crate::stage::Stage;

mod error;
mod report;

pub use error::StatusProgressionError;
pub use report::{ProgressionReport, StageReport};

/// Drives an ordered sequence of stages against one resource.
#[derive(Clone, Debug)]
pub struct StatusProgressionVerifier<S> {
    resource_label: String,
    resource_id: String,
    source: S,
    stages: Vec<Stage>,
}

impl<S: StatusSource> StatusProgressionVerifier<S> {
    /// Creates a verifier for `resource_id` that fetches statuses from
    /// `source`.
    #[must_use]
    pub fn new(
        resource_label: impl Into<String>,
        resource_id: impl Into<String>,
        source: S,
    ) -> Self {
        Self {
            resource_label: resource_label.into(),
            resource_id: resource_id.into(),
            source,
            stages: Vec::new(),
        }
    }

    /// Appends a stage; stages run in the order they were added.
    pub fn add_state(&mut self, stage: Stage) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Appends several stages in order.
    #[must_use]
    pub fn with_stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Human-readable resource kind used in error messages.
    #[must_use]
    pub fn resource_label(&self) -> &str {
        &self.resource_label
    }

    /// Identifier passed to the status source.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Registered stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Polls every stage in order and returns a report once all resolved.
    ///
    /// # Errors
    ///
    /// Returns [`StatusProgressionError::NoStages`] when no stage was added,
    /// or [`StatusProgressionError::Stage`] for the first stage that fails.
    /// Failed stages are never retried.
    pub async fn start(self) -> Result<ProgressionReport, StatusProgressionError> {
        if self.stages.is_empty() {
            return Err(StatusProgressionError::NoStages {
                resource_label: self.resource_label,
                resource_id: self.resource_id,
            });
        }

        let mut reports = Vec::with_capacity(self.stages.len());
        for (stage_index, stage) in self.stages.iter().enumerate() {
            let handoff = self
                .stages
                .get(stage_index + 1)
                .map(Stage::entry_statuses)
                .unwrap_or_default();

            let outcome = StatusPoller::new(stage)
                .with_handoff(handoff)
                .poll(&self.source, &self.resource_id)
                .await;

            match outcome {
                Ok(success) => {
                    info!(
                        resource = %self.resource_label,
                        resource_id = %self.resource_id,
                        stage_index,
                        status = %success.final_status,
                        polls = success.polls,
                        "stage resolved"
                    );
                    reports.push(StageReport::from_success(stage_index, success));
                }
                Err(failure) => {
                    error!(
                        resource = %self.resource_label,
                        resource_id = %self.resource_id,
                        stage_index,
                        error = %failure,
                        "stage failed"
                    );
                    return Err(StatusProgressionError::Stage {
                        resource_label: self.resource_label,
                        resource_id: self.resource_id,
                        stage_index,
                        trail: failure.trail,
                        elapsed: failure.elapsed,
                        kind: Box::new(failure.kind),
                    });
                }
            }
        }

        Ok(ProgressionReport {
            resource_label: self.resource_label,
            resource_id: self.resource_id,
            stages: reports,
        })
    }

    /// Runs [`StatusProgressionVerifier::start`] to completion on a
    /// current-thread runtime, blocking the calling thread between polls.
    ///
    /// # Errors
    ///
    /// Returns [`StatusProgressionError::Runtime`] when the runtime cannot be
    /// built, or any error from [`StatusProgressionVerifier::start`].
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous runtime; use `start`
    /// there instead.
    pub fn start_blocking(self) -> Result<ProgressionReport, StatusProgressionError> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|err| StatusProgressionError::Runtime {
                message: err.to_string(),
            })?;
        runtime.block_on(self.start())
    }
}
