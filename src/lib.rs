//! Status-progression polling and verification for cloud resources.
//!
//! A resource's expected lifecycle is described as an ordered list of
//! [`Stage`]s. A [`StatusProgressionVerifier`] polls a [`StatusSource`] for
//! each stage in turn and fails with a classified [`FailureKind`] when the
//! resource enters an error status, stalls past a timeout, reports a status
//! no stage anticipates, or the status fetch itself keeps failing.
//!
//! [`lifecycle`] provides stage presets for common Block Storage and Compute
//! operations, and [`probe`] checks reachability while an operation runs.

pub mod config;
pub mod lifecycle;
pub mod poller;
pub mod probe;
pub mod source;
pub mod stage;
pub mod status;
pub mod test_support;
pub mod verifier;

pub use config::{ConfigError, PollingConfig};
pub use lifecycle::verifier_for;
pub use poller::{FailureKind, PollFailure, PollSuccess, Resolution, StatusPoller};
pub use probe::{Probe, ProbeError, ProbeReport, TcpProbe, run_probed};
pub use source::{
    CommandOutput, CommandRunner, CommandSourceError, CommandStatusSource, ProcessCommandRunner,
    StatusExtraction, StatusSource, status_fn,
};
pub use stage::{PlanError, Stage, StageBuilder, StageError, StagePlan};
pub use status::{StatusSet, StatusToken, StatusTrail};
pub use verifier::{
    ProgressionReport, StageReport, StatusProgressionError, StatusProgressionVerifier,
};
