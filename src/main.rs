//! Binary entry point for the `stagewatch` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stagewatch::stage::load_plan_file;
use stagewatch::{
    CommandSourceError, CommandStatusSource, ConfigError, PlanError, PollingConfig,
    ProcessCommandRunner, ProgressionReport, StatusProgressionError, verifier_for,
};

mod cli;

use cli::{Cli, WatchCommand};

const DEFAULT_LOG_FILTER: &str = "stagewatch=info";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid stage plan: {0}")]
    Plan(#[from] PlanError),
    #[error("invalid status command: {0}")]
    Source(#[from] CommandSourceError),
    #[error("missing status command")]
    MissingCommand,
    #[error("{0}")]
    Verification(#[from] StatusProgressionError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Watch(command) => watch(command, io::stdout()).await,
    }
}

async fn watch(args: WatchCommand, mut out: impl Write) -> Result<(), CliError> {
    let config = PollingConfig::load_without_cli_args()?;
    config.validate()?;
    let stages = load_plan_file(&args.plan, &config)?;

    let (program, program_args) = split_command(&args.command)?;
    let mut source = CommandStatusSource::new(program, program_args, ProcessCommandRunner)?;
    if let Some(pointer) = args.json_pointer {
        source = source.with_json_pointer(pointer);
    }
    info!(
        resource = %args.label,
        resource_id = %args.id,
        stages = stages.len(),
        command = %source.command_line(&args.id),
        "watching status progression"
    );

    let report = verifier_for(args.label, args.id, source, stages)
        .start()
        .await?;
    write_report(&mut out, &report)?;
    Ok(())
}

fn split_command(command: &[String]) -> Result<(&str, Vec<String>), CliError> {
    let (program, rest) = command.split_first().ok_or(CliError::MissingCommand)?;
    Ok((program.as_str(), rest.to_vec()))
}

fn write_report(mut target: impl Write, report: &ProgressionReport) -> io::Result<()> {
    let final_status = report
        .final_status()
        .map_or("unknown", |status| status.as_str());
    writeln!(target, "{final_status}")
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
