//! Stage presets for common Block Storage and Compute operations.
//!
//! Each preset returns the ordered stages a resource is expected to pass
//! through after the operation is requested. Timeouts and poll cadence come
//! from [`PollingConfig`], so presets built from the same configuration agree
//! with one another.

use std::time::Duration;

use crate::config::PollingConfig;
use crate::source::StatusSource;
use crate::stage::{Stage, StageError};
use crate::verifier::StatusProgressionVerifier;

/// Status tokens reported by Block Storage volumes and snapshots.
pub mod volume {
    /// Provisioning is in progress.
    pub const CREATING: &str = "creating";
    /// Ready for use and not attached.
    pub const AVAILABLE: &str = "available";
    /// Provisioning or an operation failed.
    pub const ERROR: &str = "error";
    /// Attachment to a server is in progress.
    pub const ATTACHING: &str = "attaching";
    /// Attached to a server.
    pub const IN_USE: &str = "in-use";
    /// Detachment from a server is in progress.
    pub const DETACHING: &str = "detaching";
    /// Detachment failed.
    pub const ERROR_DETACHING: &str = "error_detaching";
    /// Deletion is in progress.
    pub const DELETING: &str = "deleting";
    /// Deletion failed.
    pub const ERROR_DELETING: &str = "error_deleting";
    /// Resize is in progress.
    pub const EXTENDING: &str = "extending";
}

/// Status tokens reported by Compute servers.
pub mod server {
    /// Build is in progress.
    pub const BUILD: &str = "BUILD";
    /// Running and reachable.
    pub const ACTIVE: &str = "ACTIVE";
    /// Build or an action failed.
    pub const ERROR: &str = "ERROR";
    /// Resize or cold migration is in progress.
    pub const RESIZE: &str = "RESIZE";
    /// Resize finished and awaits confirmation or revert.
    pub const VERIFY_RESIZE: &str = "VERIFY_RESIZE";
    /// Live migration is in progress.
    pub const MIGRATING: &str = "MIGRATING";
    /// Powered off.
    pub const SHUTOFF: &str = "SHUTOFF";
    /// Suspended to disk.
    pub const SUSPENDED: &str = "SUSPENDED";
    /// Booted from a rescue image.
    pub const RESCUE: &str = "RESCUE";
    /// Soft reboot is in progress.
    pub const REBOOT: &str = "REBOOT";
    /// Hard reboot is in progress.
    pub const HARD_REBOOT: &str = "HARD_REBOOT";
}

fn stage(
    config: &PollingConfig,
    expected: &[&str],
    acceptable: &[&str],
    error: &[&str],
    timeout: Duration,
) -> Result<Stage, StageError> {
    Stage::builder()
        .expected(expected.iter().copied())
        .acceptable(acceptable.iter().copied())
        .error(error.iter().copied())
        .timeout(timeout)
        .poll_rate(config.poll_rate())
        .poll_failure_retry_limit(config.poll_failure_retry_limit)
        .build()
}

/// Volume creation: `creating` until `available`. The timeout scales with
/// `size_gb`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn volume_create(config: &PollingConfig, size_gb: u64) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[volume::CREATING],
        &[volume::AVAILABLE],
        &[volume::ERROR],
        config.volume_create_timeout(size_gb),
    )?])
}

/// Snapshot creation: `creating` until `available`. The timeout scales with
/// the source volume's `size_gb`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn snapshot_create(config: &PollingConfig, size_gb: u64) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[volume::CREATING],
        &[volume::AVAILABLE],
        &[volume::ERROR],
        config.snapshot_create_timeout(size_gb),
    )?])
}

/// Volume attachment: `available` or `attaching` until `in-use`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn volume_attach(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[volume::AVAILABLE, volume::ATTACHING],
        &[volume::IN_USE],
        &[volume::ERROR],
        Duration::from_secs(config.volume_attach_timeout_secs),
    )?])
}

/// Volume detachment: `in-use` or `detaching` until `available`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn volume_detach(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[volume::IN_USE, volume::DETACHING],
        &[volume::AVAILABLE],
        &[volume::ERROR, volume::ERROR_DETACHING],
        Duration::from_secs(config.volume_attach_timeout_secs),
    )?])
}

/// Server build: `BUILD` until `ACTIVE`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn server_build(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[server::BUILD],
        &[server::ACTIVE],
        &[server::ERROR],
        Duration::from_secs(config.server_build_timeout_secs),
    )?])
}

/// Resize: `ACTIVE` until the resize starts, then `RESIZE` until
/// `VERIFY_RESIZE`.
///
/// A resize that finishes between two polls of the first stage hands off on
/// `VERIFY_RESIZE` directly.
///
/// # Errors
///
/// Returns [`StageError`] when a configured timeout is zero.
pub fn server_resize(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![
        stage(
            config,
            &[server::ACTIVE],
            &[],
            &[server::ERROR],
            Duration::from_secs(config.server_action_timeout_secs),
        )?,
        stage(
            config,
            &[server::RESIZE],
            &[server::VERIFY_RESIZE],
            &[server::ERROR],
            Duration::from_secs(config.server_resize_timeout_secs),
        )?,
    ])
}

/// Resize confirmation: `VERIFY_RESIZE` until `ACTIVE`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn server_confirm_resize(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[server::VERIFY_RESIZE],
        &[server::ACTIVE],
        &[server::ERROR],
        Duration::from_secs(config.server_resize_timeout_secs),
    )?])
}

/// Live migration: `MIGRATING` until `ACTIVE`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn server_live_migrate(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[server::MIGRATING],
        &[server::ACTIVE],
        &[server::ERROR],
        Duration::from_secs(config.server_migrate_timeout_secs),
    )?])
}

/// Rescue: `ACTIVE` until `RESCUE`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn server_rescue(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[server::ACTIVE],
        &[server::RESCUE],
        &[server::ERROR],
        Duration::from_secs(config.server_action_timeout_secs),
    )?])
}

/// Suspend: `ACTIVE` until `SUSPENDED`.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn server_suspend(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    Ok(vec![stage(
        config,
        &[server::ACTIVE],
        &[server::SUSPENDED],
        &[server::ERROR],
        Duration::from_secs(config.server_action_timeout_secs),
    )?])
}

/// Reboot: `ACTIVE` until the reboot starts, then `REBOOT` or `HARD_REBOOT`
/// until `ACTIVE` again.
///
/// The first stage only resolves once a reboot status is observed, so the
/// poll rate must be shorter than the reboot itself.
///
/// # Errors
///
/// Returns [`StageError`] when the configured timeout is zero.
pub fn server_reboot(config: &PollingConfig) -> Result<Vec<Stage>, StageError> {
    let timeout = Duration::from_secs(config.server_action_timeout_secs);
    Ok(vec![
        stage(config, &[server::ACTIVE], &[], &[server::ERROR], timeout)?,
        stage(
            config,
            &[server::REBOOT, server::HARD_REBOOT],
            &[server::ACTIVE],
            &[server::ERROR],
            timeout,
        )?,
    ])
}

/// Builds a verifier with `stages` already registered.
#[must_use]
pub fn verifier_for<S: StatusSource>(
    resource_label: impl Into<String>,
    resource_id: impl Into<String>,
    source: S,
    stages: Vec<Stage>,
) -> StatusProgressionVerifier<S> {
    StatusProgressionVerifier::new(resource_label, resource_id, source).with_stages(stages)
}
