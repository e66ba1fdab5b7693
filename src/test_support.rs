//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::config::{self, PollingConfig};
use crate::source::{CommandOutput, CommandRunner, CommandSourceError, SourceFuture, StatusSource};
use crate::status::StatusToken;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Arc<Mutex<VecDeque<CommandOutput>>>,
    invocations: Arc<Mutex<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        lock(&self.invocations).clone()
    }

    /// Pushes a successful exit status with the given stdout.
    pub fn push_stdout(&self, stdout: impl Into<String>) {
        self.push_output(Some(0), stdout, "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push_output(Some(code), "", "simulated failure");
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        lock(&self.responses).push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [OsString],
    ) -> SourceFuture<'a, CommandOutput, CommandSourceError> {
        lock(&self.invocations).push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        let response = lock(&self.responses)
            .pop_front()
            .ok_or_else(|| CommandSourceError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            });
        Box::pin(async move { response })
    }
}

/// Error returned by [`ScriptedStatusSource`] for scripted fetch failures.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted fetch failure: {message}")]
pub struct ScriptedFetchError {
    /// Failure description.
    pub message: String,
}

#[derive(Clone, Debug)]
enum ScriptedResponse {
    Status(StatusToken),
    Failure(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: VecDeque<ScriptedResponse>,
    repeat: Option<ScriptedResponse>,
    fetched_ids: Vec<String>,
}

/// Status source that replays scripted statuses and failures in FIFO order.
///
/// Once the script is exhausted the source repeats the response set with
/// [`ScriptedStatusSource::then_repeat`], or fails every fetch when none was
/// set. Clones share the same script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedStatusSource {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedStatusSource {
    /// Creates a source with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that replays `statuses` in order.
    #[must_use]
    pub fn from_statuses<I, T>(statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StatusToken>,
    {
        let source = Self::new();
        for status in statuses {
            source.push_status(status);
        }
        source
    }

    /// Queues a successful fetch.
    pub fn push_status(&self, status: impl Into<StatusToken>) {
        lock(&self.state)
            .responses
            .push_back(ScriptedResponse::Status(status.into()));
    }

    /// Queues `count` consecutive fetch failures.
    pub fn push_failures(&self, count: usize) {
        let mut state = lock(&self.state);
        for attempt in 1..=count {
            state
                .responses
                .push_back(ScriptedResponse::Failure(format!("attempt {attempt}")));
        }
    }

    /// Repeats `status` forever once the queued script is exhausted.
    #[must_use]
    pub fn then_repeat(self, status: impl Into<StatusToken>) -> Self {
        lock(&self.state).repeat = Some(ScriptedResponse::Status(status.into()));
        self
    }

    /// Repeats a fetch failure forever once the queued script is exhausted.
    #[must_use]
    pub fn then_fail_forever(self) -> Self {
        lock(&self.state).repeat = Some(ScriptedResponse::Failure(String::from("repeated")));
        self
    }

    /// Number of fetches made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        lock(&self.state).fetched_ids.len()
    }

    /// Resource ids passed to each fetch, in order.
    #[must_use]
    pub fn fetched_ids(&self) -> Vec<String> {
        lock(&self.state).fetched_ids.clone()
    }

    fn next_response(&self, resource_id: &str) -> Result<StatusToken, ScriptedFetchError> {
        let mut state = lock(&self.state);
        state.fetched_ids.push(resource_id.to_owned());
        let response = state
            .responses
            .pop_front()
            .or_else(|| state.repeat.clone())
            .unwrap_or_else(|| ScriptedResponse::Failure(String::from("script exhausted")));
        match response {
            ScriptedResponse::Status(status) => Ok(status),
            ScriptedResponse::Failure(message) => Err(ScriptedFetchError { message }),
        }
    }
}

impl StatusSource for ScriptedStatusSource {
    type Error = ScriptedFetchError;

    fn fetch_status<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> SourceFuture<'a, StatusToken, ScriptedFetchError> {
        Box::pin(async move { self.next_response(resource_id) })
    }
}

/// Returns a [`PollingConfig`] populated with the documented defaults.
#[must_use]
pub const fn default_polling_config() -> PollingConfig {
    PollingConfig {
        poll_rate_secs: config::DEFAULT_POLL_RATE_SECS,
        poll_failure_retry_limit: config::DEFAULT_POLL_FAILURE_RETRY_LIMIT,
        volume_create_min_timeout_secs: config::DEFAULT_VOLUME_CREATE_MIN_TIMEOUT_SECS,
        volume_create_per_gb_secs: config::DEFAULT_VOLUME_CREATE_PER_GB_SECS,
        volume_create_max_timeout_secs: config::DEFAULT_VOLUME_CREATE_MAX_TIMEOUT_SECS,
        snapshot_create_min_timeout_secs: config::DEFAULT_SNAPSHOT_CREATE_MIN_TIMEOUT_SECS,
        snapshot_create_per_gb_secs: config::DEFAULT_SNAPSHOT_CREATE_PER_GB_SECS,
        snapshot_create_max_timeout_secs: config::DEFAULT_SNAPSHOT_CREATE_MAX_TIMEOUT_SECS,
        volume_attach_timeout_secs: config::DEFAULT_VOLUME_ATTACH_TIMEOUT_SECS,
        server_build_timeout_secs: config::DEFAULT_SERVER_BUILD_TIMEOUT_SECS,
        server_resize_timeout_secs: config::DEFAULT_SERVER_RESIZE_TIMEOUT_SECS,
        server_migrate_timeout_secs: config::DEFAULT_SERVER_MIGRATE_TIMEOUT_SECS,
        server_action_timeout_secs: config::DEFAULT_SERVER_ACTION_TIMEOUT_SECS,
    }
}

/// Produces a minimal JSON payload shaped like a Block Storage volume show
/// response.
#[must_use]
pub fn json_volume(id: &str, status: &str) -> String {
    format!("{{\"volume\":{{\"id\":\"{id}\",\"status\":\"{status}\"}}}}")
}
