//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// Default wait for `send` and `object`.
pub(crate) const DEFAULT_WAIT_MS: u64 = 2_000;

/// How results are written to stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty JSON for one-shot commands, one compact line per response
    /// while watching.
    #[default]
    Json,
    /// The indentation-tree text the simulator itself uses.
    Tree,
}

/// Command-line client for the DCS World export socket.
#[derive(Parser, Debug)]
#[command(name = "dcslink", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Controls how results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub(crate) format: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Lists catalogue commands whose syntax contains PATTERN.
    Catalog {
        #[arg(value_name = "PATTERN")]
        pattern: Option<String>,
    },
    /// Sends one catalogue command and prints its result.
    Send {
        /// Catalogue command id.
        #[arg(value_name = "ID")]
        id: u32,
        /// Parameter overrides.
        #[arg(value_name = "NAME=VALUE")]
        parameters: Vec<String>,
        /// How long to wait for the response.
        #[arg(long, default_value_t = DEFAULT_WAIT_MS)]
        wait_ms: u64,
    },
    /// Fetches one world object by id.
    Object {
        #[arg(value_name = "ID")]
        id: u64,
        /// How long to wait for the response.
        #[arg(long, default_value_t = DEFAULT_WAIT_MS)]
        timeout_ms: u64,
    },
    /// Polls world objects and own aircraft data, printing every response.
    Watch {
        /// Time between polling rounds.
        #[arg(long, default_value_t = 5_000)]
        interval_ms: u64,
        /// Stop after this many rounds have been answered.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        rounds: Option<u64>,
    },
}
