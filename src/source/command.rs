//! Status source that shells out to a command-line client.
//!
//! Every argument containing [`ID_PLACEHOLDER`] has the placeholder replaced by
//! the resource id. The status is read from trimmed stdout, or from a JSON
//! pointer into stdout when the client prints JSON.

use std::ffi::OsString;

use shell_escape::unix::escape;
use thiserror::Error;

use crate::status::StatusToken;

use super::{CommandRunner, SourceFuture, StatusSource};

/// Placeholder substituted with the resource id in command arguments.
pub const ID_PLACEHOLDER: &str = "{id}";

/// How the status is extracted from command output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StatusExtraction {
    /// The whole of stdout, trimmed.
    Stdout,
    /// A string value at an RFC 6901 JSON pointer (for example
    /// `/volume/status`).
    JsonPointer(String),
}

/// Errors raised while fetching a status through a command.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandSourceError {
    /// Raised when the source is missing a required field.
    #[error("missing {field}")]
    InvalidConfig {
        /// Name of the missing or invalid field.
        field: String,
    },
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the command exits with a non-zero status.
    #[error("{program} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Program that failed.
        program: String,
        /// Exit status reported by the OS.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the command.
        stderr: String,
    },
    /// Raised when the command printed no status.
    #[error("{program} printed no status")]
    EmptyStatus {
        /// Program that was run.
        program: String,
    },
    /// Raised when stdout is not valid JSON.
    #[error("failed to parse {program} output as JSON: {message}")]
    Json {
        /// Program that was run.
        program: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when the JSON pointer does not resolve to a string.
    #[error("no string status at {pointer} in {program} output")]
    MissingField {
        /// Program that was run.
        program: String,
        /// JSON pointer that was looked up.
        pointer: String,
    },
}

/// Fetches statuses by running a command through a [`CommandRunner`].
#[derive(Clone, Debug)]
pub struct CommandStatusSource<R: CommandRunner> {
    program: String,
    args: Vec<String>,
    extraction: StatusExtraction,
    runner: R,
}

impl<R: CommandRunner> CommandStatusSource<R> {
    /// Creates a source that reads the status from trimmed stdout.
    ///
    /// # Errors
    ///
    /// Returns [`CommandSourceError::InvalidConfig`] when `program` is blank.
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        runner: R,
    ) -> Result<Self, CommandSourceError> {
        let trimmed_program = program.into().trim().to_owned();
        if trimmed_program.is_empty() {
            return Err(CommandSourceError::InvalidConfig {
                field: String::from("program"),
            });
        }
        Ok(Self {
            program: trimmed_program,
            args,
            extraction: StatusExtraction::Stdout,
            runner,
        })
    }

    /// Reads the status from a JSON pointer into stdout instead.
    #[must_use]
    pub fn with_json_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.extraction = StatusExtraction::JsonPointer(pointer.into());
        self
    }

    /// Returns the configured extraction mode.
    #[must_use]
    pub const fn extraction(&self) -> &StatusExtraction {
        &self.extraction
    }

    /// Renders the command for `resource_id` as a shell-escaped string for
    /// logs and error messages.
    #[must_use]
    pub fn command_line(&self, resource_id: &str) -> String {
        let mut rendered = escape(self.program.as_str().into()).into_owned();
        for arg in &self.args {
            rendered.push(' ');
            let substituted = arg.replace(ID_PLACEHOLDER, resource_id);
            rendered.push_str(escape(substituted.as_str().into()).as_ref());
        }
        rendered
    }

    fn render_args(&self, resource_id: &str) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| OsString::from(arg.replace(ID_PLACEHOLDER, resource_id)))
            .collect()
    }

    async fn run_for(&self, resource_id: &str) -> Result<StatusToken, CommandSourceError> {
        let args = self.render_args(resource_id);
        let output = self.runner.run(&self.program, &args).await?;
        if !output.is_success() {
            let status_text = output
                .code
                .map_or_else(|| String::from("unknown"), |code| code.to_string());
            return Err(CommandSourceError::CommandFailure {
                program: self.program.clone(),
                status: output.code,
                status_text,
                stderr: output.stderr.trim().to_owned(),
            });
        }
        self.extract(&output.stdout)
    }

    fn extract(&self, stdout: &str) -> Result<StatusToken, CommandSourceError> {
        let raw = match &self.extraction {
            StatusExtraction::Stdout => stdout.trim().to_owned(),
            StatusExtraction::JsonPointer(pointer) => {
                let document: serde_json::Value =
                    serde_json::from_str(stdout).map_err(|err| CommandSourceError::Json {
                        program: self.program.clone(),
                        message: err.to_string(),
                    })?;
                document
                    .pointer(pointer)
                    .and_then(serde_json::Value::as_str)
                    .map(|value| value.trim().to_owned())
                    .ok_or_else(|| CommandSourceError::MissingField {
                        program: self.program.clone(),
                        pointer: pointer.clone(),
                    })?
            }
        };

        if raw.is_empty() {
            return Err(CommandSourceError::EmptyStatus {
                program: self.program.clone(),
            });
        }
        Ok(StatusToken::from(raw))
    }
}

impl<R: CommandRunner + Sync> StatusSource for CommandStatusSource<R> {
    type Error = CommandSourceError;

    fn fetch_status<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> SourceFuture<'a, StatusToken, CommandSourceError> {
        Box::pin(self.run_for(resource_id))
    }
}
