//! Process execution behind [`super::CommandStatusSource`].
//!
//! Status commands run through Tokio's child-process support, so a slow
//! cloud client yields to other tasks on the same runtime (for example a
//! reachability prober) instead of blocking the thread until it exits.

use std::ffi::OsString;
use std::process::{Output, Stdio};

use tokio::process::Command;

use super::{CommandSourceError, SourceFuture};

/// Exit code and captured streams of one status command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with code zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Executes a status command to completion.
///
/// [`ProcessCommandRunner`] spawns real processes; tests substitute scripted
/// runners that replay canned outputs.
pub trait CommandRunner {
    /// Runs `program` with `args` and collects its output.
    ///
    /// # Errors
    ///
    /// Returns [`CommandSourceError::Spawn`] when the process cannot be
    /// started or awaited. A non-zero exit is reported through
    /// [`CommandOutput::code`], not as an error.
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [OsString],
    ) -> SourceFuture<'a, CommandOutput, CommandSourceError>;
}

/// Spawns status commands as child processes with stdin closed.
///
/// A fetch that is dropped mid-flight kills its child.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [OsString],
    ) -> SourceFuture<'a, CommandOutput, CommandSourceError> {
        Box::pin(async move {
            Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map(CommandOutput::from)
                .map_err(|err| CommandSourceError::Spawn {
                    program: program.to_owned(),
                    message: err.to_string(),
                })
        })
    }
}
