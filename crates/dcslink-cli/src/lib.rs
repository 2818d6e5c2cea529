//! Command-line runtime for the dcslink simulator client.
//!
//! The runtime owns argument parsing, configuration bootstrapping, and
//! output rendering. It runs from the binary entrypoint and from tests where
//! the configuration loader and IO streams are substituted.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use dcslink_config::Config;
use tracing::debug;

mod cli;
mod commands;
mod config;
mod errors;
mod output;

use cli::{Cli, CliCommand};
pub use cli::OutputFormat;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    match execute(cli, &split.config_arguments, stdout, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W, L>(
    cli: Cli,
    config_arguments: &[OsString],
    stdout: &mut W,
    loader: &L,
) -> Result<(), AppError>
where
    W: Write,
    L: ConfigLoader,
{
    let format = cli.format;
    match cli.command {
        CliCommand::Catalog { pattern } => output::write_catalog(
            stdout,
            dcslink::catalog::matching(pattern.as_deref().unwrap_or_default()),
            format,
        ),
        CliCommand::Send {
            id,
            parameters,
            wait_ms,
        } => {
            let config = prepare(loader, config_arguments)?;
            commands::send(config, id, &parameters, wait_ms, format, stdout)
        }
        CliCommand::Object { id, timeout_ms } => {
            let config = prepare(loader, config_arguments)?;
            commands::object(config, id, timeout_ms, format, stdout)
        }
        CliCommand::Watch {
            interval_ms,
            rounds,
        } => {
            let config = prepare(loader, config_arguments)?;
            commands::watch(config, interval_ms, rounds, format, stdout)
        }
    }
}

/// Loads configuration and installs logging for commands that connect.
fn prepare(loader: &impl ConfigLoader, config_arguments: &[OsString]) -> Result<Config, AppError> {
    let config = loader.load(config_arguments)?;
    dcslink::telemetry::initialise(&config)?;
    debug!(target: CLI_TARGET, endpoint = %config.endpoint(), "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests;
