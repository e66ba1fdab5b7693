//! Command-line interface definitions for the `stagewatch` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `stagewatch` binary.
#[derive(Debug, Parser)]
#[command(
    name = "stagewatch",
    about = "Poll a cloud resource until it completes an ordered status progression",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Verify a status progression using a command that prints the status.
    #[command(
        name = "watch",
        about = "Verify a status progression using a command that prints the status"
    )]
    Watch(WatchCommand),
}

/// Arguments for the `stagewatch watch` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct WatchCommand {
    /// Human-readable resource kind used in messages (for example `volume`).
    #[arg(long, value_name = "LABEL", default_value = "resource")]
    pub(crate) label: String,
    /// Identifier substituted for `{id}` in the status command.
    #[arg(long, value_name = "ID")]
    pub(crate) id: String,
    /// JSON file listing the stages in order.
    ///
    /// Relative paths, including ones with `..` components, resolve against
    /// the working directory.
    #[arg(long, value_name = "PATH")]
    pub(crate) plan: String,
    /// JSON pointer locating the status in the command's JSON output.
    ///
    /// When omitted the trimmed standard output is used as the status.
    #[arg(long, value_name = "POINTER")]
    pub(crate) json_pointer: Option<String>,
    /// Command that prints the resource status (use -- to separate flags).
    #[arg(required = true, trailing_var_arg = true)]
    pub(crate) command: Vec<String>,
}
